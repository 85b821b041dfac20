//! Client-side GraphQL document construction and response decoding.
//!
//! Design goals:
//! - One shape, both directions: the caller builds a [`Value`] tree once;
//!   the writer renders the minified document from it, the decoder fills the
//!   same tree back in from the response.
//! - No reflection, no macros: every kind the library understands is a
//!   `Value` variant, every walk an exhaustive match.
//! - Polymorphism via `__typename`: inline fragments decode exclusively when
//!   the response carries a typename, permissively when it does not.
//! - Transport stays out: callers get a request body and hand back response
//!   bytes, nothing more.
//!
//! ```
//! use graphql_shape::{construct_query, decode, Field, Record, Value};
//!
//! let mut q = Value::Record(Record::new(vec![Field::new(
//!     "Me",
//!     Value::Record(Record::new(vec![
//!         Field::new("Name", Value::Str(String::new())),
//!         Field::new("Height", Value::Float(0.0)),
//!     ])),
//! )]));
//! assert_eq!(construct_query(&q, None, &[]).unwrap(), "{me{name,height}}");
//!
//! decode(br#"{"me": {"name": "Luke Skywalker", "height": 1.72}}"#, &mut q).unwrap();
//! ```

pub mod args;
pub mod decode;
pub mod error;
pub mod introspect;
pub mod op;
pub mod response;
pub mod tag;
pub mod token;
pub mod value;
pub mod write;

pub use args::write_arguments;
pub use decode::decode;
pub use error::{Error, Result};
pub use op::{OperationOption, construct_mutation, construct_query, construct_subscription};
pub use response::{
    Errors, GraphQLError, ResponseEnvelope, build_request_body, parse_response,
};
pub use value::{Field, Record, Value, Variables};
pub use write::write_selection;
