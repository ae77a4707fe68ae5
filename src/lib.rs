//! # nacha
//!
//! Encoder and decoder for NACHA ACH files: fixed-width 94-character records
//! describing batches of debits and credits.
//!
//! ## Design Principles
//!
//! - **Exact widths**: every field packs to its declared width or fails;
//!   values are never truncated
//! - **Typed records**: each record kind is a plain struct over a static
//!   schema of fields
//! - **Incremental totals**: the [`Writer`] folds each entry into batch and
//!   file control totals as it closes, and writes each record exactly once
//! - **Strict nesting**: scopes close in LIFO order; a scope closed with an
//!   error writes nothing and changes no totals
//!
//! ## Example
//!
//! ```
//! use nacha::{standard_entry_class, Amount, NewCompanyBatch, NewEntry, NewFile, Reader};
//! use nacha::{NachaError, ServiceClassCode, TransactionCode, Writer};
//! use std::io::Cursor;
//!
//! let mut writer = Writer::new(Vec::new());
//! writer
//!     .file(
//!         NewFile {
//!             immediate_destination: 91000019,
//!             immediate_destination_name: "WELLS FARGO".to_string(),
//!             immediate_origin: "1273720697".to_string(),
//!             immediate_origin_name: "ALALALAD PAYMENTS".to_string(),
//!             ..NewFile::default()
//!         },
//!         |w| {
//!             w.company_batch(
//!                 NewCompanyBatch {
//!                     service_class_code: ServiceClassCode::CREDITS,
//!                     company_name: "ALALALAD".to_string(),
//!                     company_discretionary_data: None,
//!                     company_id: "2273720697".to_string(),
//!                     standard_entry_class: standard_entry_class::PPD.to_string(),
//!                     company_entry_description: "payouts".to_string(),
//!                     company_descriptive_date: None,
//!                     effective_entry_date: None,
//!                     originating_dfi_id: 12737206,
//!                 },
//!                 |w| {
//!                     w.entry(NewEntry {
//!                         transaction_code: TransactionCode::CHECKING_CREDIT,
//!                         receiving_dfi_routing_number: "112345678".to_string(),
//!                         receiving_dfi_account_number: "1123456789".to_string(),
//!                         amount: Amount::from_cents(12345),
//!                         individual_id: "98789789".to_string(),
//!                         individual_name: "Test Credit 1".to_string(),
//!                         discretionary_data: None,
//!                         trace_number: None,
//!                     })
//!                 },
//!             )
//!         },
//!     )
//!     .unwrap();
//!
//! let bytes = writer.into_inner();
//! let file = Reader::new("memory", Cursor::new(bytes)).read_file().unwrap();
//! file.verify().unwrap();
//! assert_eq!(file.control.total_file_credit_entry_amount, Amount::from_cents(12345));
//! # Ok::<(), NachaError>(())
//! ```

pub mod amount;
pub mod codes;
pub mod error;
pub mod field;
pub mod reader;
pub mod records;
pub mod schema;
pub mod totals;
pub mod writer;

pub use amount::{Amount, AmountError};
pub use codes::{standard_entry_class, EntryDirection, ServiceClassCode, TransactionCode};
pub use error::{NachaError, Result};
pub use field::{Align, Field, FieldKind, Literal, Value};
pub use reader::{AchFile, CompanyBatch, Entry, Reader};
pub use records::{
    AchRecord, CompanyBatchControl, CompanyBatchHeader, EntryDetail, EntryDetailAddendum,
    FileControl, FileHeader, RECORD_SIZE,
};
pub use schema::{Conversion, FieldValue, RawRecord, Record, Schema};
pub use totals::{ControlTotals, RoutingNumber};
pub use writer::{BlockAccounting, NewCompanyBatch, NewEntry, NewFile, Writer, WriterConfig};
