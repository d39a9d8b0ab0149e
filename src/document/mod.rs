//! JSON:API documents: response rendering and request parsing.
//!
//! A response document looks like:
//!
//! ```json
//! {
//!   "data": {
//!     "type": "property", "id": "1",
//!     "attributes": {},
//!     "relationships": { "myStuff": { "data": { "type": "tractor", "id": "1" } } }
//!   },
//!   "included": [
//!     { "type": "tractor", "id": "1", "attributes": { "horsepower": 102 }, "relationships": {} }
//!   ]
//! }
//! ```

mod deserializer;
mod model;
mod serializer;

pub use deserializer::{LinkageIntent, parse_create, parse_linkage, parse_patch};
pub use model::{
    Document, DocumentMeta, IncomingResource, Linkage, LinkageDocument, PrimaryData,
    RelationshipObject, ResourceDocument, ResourceObject, error_document,
};
pub use serializer::{Serializer, to_json};
