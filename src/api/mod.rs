// DramaShelf - Short Drama Catalog Core
// Copyright (C) 2026 DramaShelf contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Catalog API layer
//!
//! Everything between the upstream catalog service and the canonical model:
//! the HTTP transport facade, the response normalizer, the cached catalog
//! client with its multi-page aggregator, the fallback resolver, and the
//! stream variant selector.

pub mod catalog;
pub mod client;
pub mod normalize;
pub mod resolve;
pub mod stream;

// Re-export commonly used types
pub use catalog::Catalog;
pub use client::{CatalogTransport, ClientConfig, Facet, HttpTransport, Locale};
pub use normalize::DetailPayload;
pub use resolve::{resolve, resolve_with_episodes};
pub use stream::select_best_url;
