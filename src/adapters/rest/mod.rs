//! REST adapters for the external services.
//!
//! All three services live behind one base URL and share a client:
//!
//! | Port                    | Request                                    |
//! |-------------------------|--------------------------------------------|
//! | `DocumentRepository`    | `GET  /proposals/{id}`                     |
//! |                         | `PUT  /proposals/{id}/sections/{sid}`      |
//! | `DocumentExportService` | `POST /export/{format}`                    |
//! | `SectionGenerator`      | `POST /ai/generate-section`                |

mod client;
mod document_repository;
mod renderer;
mod section_generator;

pub use client::{RestClient, RestClientConfig};
pub use document_repository::HttpDocumentRepository;
pub use renderer::HttpRenderer;
pub use section_generator::HttpSectionGenerator;
