//! The six record layouts of an ACH file.
//!
//! Every line is 94 characters and starts with a one-character record type:
//!
//! ```text
//! 1  FileHeader
//! 5  CompanyBatchHeader
//! 6  EntryDetail
//! 7  EntryDetailAddendum
//! 8  CompanyBatchControl
//! 9  FileControl
//! ```
//!
//! Constant and reserved fields only exist in the schemas; the typed structs
//! carry the fields a caller actually chooses.

use crate::amount::Amount;
use crate::codes::{standard_entry_class, ServiceClassCode, TransactionCode};
use crate::error::{NachaError, Result};
use crate::field::{Align, Field, Literal};
use crate::schema::{RawRecord, Record, Schema};
use chrono::{NaiveDate, NaiveTime};

/// Width of every record in the file.
pub const RECORD_SIZE: usize = 94;

/// Records per physical block.
pub const BLOCKING_FACTOR: u64 = 10;

const fn record_type(code: &'static str) -> Field {
    Field::alphanumeric("record_type", 1).constant(Literal::Text(code))
}

pub static FILE_HEADER: Schema = Schema {
    name: "FileHeader",
    fields: &[
        record_type("1"),
        Field::numeric("priority_code", 2).constant(Literal::Numeric(1)),
        Field::numeric("immediate_destination", 10).pad(' '),
        Field::alphanumeric("immediate_origin", 10),
        Field::numeric("file_creation_date", 6),
        Field::numeric("file_creation_time", 4),
        Field::alphanumeric("file_id_modifier", 1),
        Field::numeric("record_size", 3).constant(Literal::Numeric(RECORD_SIZE as u64)),
        Field::numeric("blocking_factor", 2).constant(Literal::Numeric(BLOCKING_FACTOR)),
        Field::numeric("format_code", 1).constant(Literal::Numeric(1)),
        Field::alphanumeric("immediate_destination_name", 23),
        Field::alphanumeric("immediate_origin_name", 23),
        Field::alphanumeric("reference_code", 8).default_value(Literal::Text("")),
    ],
};

pub static COMPANY_BATCH_HEADER: Schema = Schema {
    name: "CompanyBatchHeader",
    fields: &[
        record_type("5"),
        Field::numeric("service_class_code", 3).labels(ServiceClassCode::LABELS),
        Field::alphanumeric("company_name", 16),
        Field::alphanumeric("company_discretionary_data", 20).optional(),
        Field::alphanumeric("company_id", 10),
        Field::alphanumeric("standard_entry_class", 3).labels(standard_entry_class::LABELS),
        Field::alphanumeric("company_entry_description", 10),
        Field::alphanumeric("company_descriptive_date", 6),
        Field::numeric("effective_entry_date", 6),
        // filled in by the receiving bank
        Field::alphanumeric("settlement_date", 3).reserved(),
        Field::numeric("originator_status", 1).constant(Literal::Numeric(1)),
        Field::numeric("originating_dfi_id", 8),
        Field::numeric("batch_number", 7),
    ],
};

pub static ENTRY_DETAIL: Schema = Schema {
    name: "EntryDetail",
    fields: &[
        record_type("6"),
        Field::numeric("transaction_code", 2).labels(TransactionCode::LABELS),
        Field::numeric("receiving_dfi_trn", 8),
        Field::numeric("receiving_dfi_trn_check_digit", 1),
        Field::alphanumeric("receiving_dfi_account_number", 17).align(Align::Right),
        Field::numeric("amount", 10),
        Field::alphanumeric("individual_id", 15),
        Field::alphanumeric("individual_name", 22),
        Field::alphanumeric("discretionary_data", 2),
        Field::numeric("addenda_record_indicator", 1),
        Field::numeric("trace_number", 15),
    ],
};

pub static ENTRY_DETAIL_ADDENDUM: Schema = Schema {
    name: "EntryDetailAddendum",
    fields: &[
        record_type("7"),
        Field::numeric("addenda_type", 2).constant(Literal::Numeric(5)),
        Field::alphanumeric("payment_related_information", 80),
        Field::numeric("addenda_sequence_number", 4),
        Field::numeric("entry_detail_sequence_number", 7),
    ],
};

pub static COMPANY_BATCH_CONTROL: Schema = Schema {
    name: "CompanyBatchControl",
    fields: &[
        record_type("8"),
        Field::numeric("service_class_code", 3).labels(ServiceClassCode::LABELS),
        Field::numeric("entry_addenda_count", 6),
        Field::numeric("entry_hash", 10),
        Field::numeric("total_batch_debit_entry_amount", 12),
        Field::numeric("total_batch_credit_entry_amount", 12),
        Field::alphanumeric("company_id", 10),
        Field::alphanumeric("message_authentication_code", 19).reserved(),
        Field::alphanumeric("blank", 6).reserved(),
        Field::numeric("originating_dfi_id", 8),
        Field::numeric("batch_number", 7),
    ],
};

pub static FILE_CONTROL: Schema = Schema {
    name: "FileControl",
    fields: &[
        record_type("9"),
        Field::numeric("batch_count", 6),
        Field::numeric("block_count", 6),
        Field::numeric("entry_addenda_record_count", 8),
        Field::numeric("entry_hash_total", 10),
        Field::numeric("total_file_debit_entry_amount", 12),
        Field::numeric("total_file_credit_entry_amount", 12),
        Field::alphanumeric("filler", 39).reserved(),
    ],
};

/// Converts a loaded line into its typed record.
type Decode = fn(RawRecord) -> Result<AchRecord>;

fn decode<R: Record + Into<AchRecord>>(raw: RawRecord) -> Result<AchRecord> {
    R::from_raw(raw).map(Into::into)
}

/// Every layout in file order, with the decoder for its typed form.
static CATALOG: [(&Schema, Decode); 6] = [
    (&FILE_HEADER, decode::<FileHeader>),
    (&COMPANY_BATCH_HEADER, decode::<CompanyBatchHeader>),
    (&ENTRY_DETAIL, decode::<EntryDetail>),
    (&ENTRY_DETAIL_ADDENDUM, decode::<EntryDetailAddendum>),
    (&COMPANY_BATCH_CONTROL, decode::<CompanyBatchControl>),
    (&FILE_CONTROL, decode::<FileControl>),
];

/// Every schema, in file order.
pub fn schemas() -> impl Iterator<Item = &'static Schema> {
    CATALOG.iter().map(|&(schema, _)| schema)
}

/// Looks up the schema for a record-type discriminator.
pub fn schema_for(type_code: char) -> Option<&'static Schema> {
    schemas().find(|schema| schema.type_code() == Some(type_code))
}

/// Opens a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub immediate_destination: u64,
    pub immediate_origin: String,
    pub file_creation_date: NaiveDate,
    pub file_creation_time: NaiveTime,
    pub file_id_modifier: char,
    pub immediate_destination_name: String,
    pub immediate_origin_name: String,
    pub reference_code: String,
}

impl Record for FileHeader {
    fn schema() -> &'static Schema {
        &FILE_HEADER
    }

    fn to_raw(&self) -> Result<RawRecord> {
        let mut raw = RawRecord::new(&FILE_HEADER);
        raw.put("immediate_destination", &self.immediate_destination)?;
        raw.put("immediate_origin", &self.immediate_origin)?;
        raw.put("file_creation_date", &self.file_creation_date)?;
        raw.put("file_creation_time", &self.file_creation_time)?;
        raw.put("file_id_modifier", &self.file_id_modifier)?;
        raw.put("immediate_destination_name", &self.immediate_destination_name)?;
        raw.put("immediate_origin_name", &self.immediate_origin_name)?;
        raw.put("reference_code", &self.reference_code)?;
        Ok(raw)
    }

    fn from_raw(mut raw: RawRecord) -> Result<Self> {
        Ok(FileHeader {
            immediate_destination: raw.take("immediate_destination")?,
            immediate_origin: raw.take("immediate_origin")?,
            file_creation_date: raw.take("file_creation_date")?,
            file_creation_time: raw.take("file_creation_time")?,
            file_id_modifier: raw.take("file_id_modifier")?,
            immediate_destination_name: raw.take("immediate_destination_name")?,
            immediate_origin_name: raw.take("immediate_origin_name")?,
            reference_code: raw.take("reference_code")?,
        })
    }
}

/// Opens a batch of entries from one company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyBatchHeader {
    pub service_class_code: ServiceClassCode,
    pub company_name: String,
    pub company_discretionary_data: String,
    pub company_id: String,
    pub standard_entry_class: String,
    pub company_entry_description: String,
    pub company_descriptive_date: String,
    /// All zeros on the wire when unset.
    pub effective_entry_date: Option<NaiveDate>,
    pub originating_dfi_id: u64,
    pub batch_number: u64,
}

impl Record for CompanyBatchHeader {
    fn schema() -> &'static Schema {
        &COMPANY_BATCH_HEADER
    }

    fn to_raw(&self) -> Result<RawRecord> {
        let mut raw = RawRecord::new(&COMPANY_BATCH_HEADER);
        raw.put("service_class_code", &self.service_class_code)?;
        raw.put("company_name", &self.company_name)?;
        raw.put("company_discretionary_data", &self.company_discretionary_data)?;
        raw.put("company_id", &self.company_id)?;
        raw.put("standard_entry_class", &self.standard_entry_class)?;
        raw.put("company_entry_description", &self.company_entry_description)?;
        raw.put("company_descriptive_date", &self.company_descriptive_date)?;
        raw.put("effective_entry_date", &self.effective_entry_date)?;
        raw.put("originating_dfi_id", &self.originating_dfi_id)?;
        raw.put("batch_number", &self.batch_number)?;
        Ok(raw)
    }

    fn from_raw(mut raw: RawRecord) -> Result<Self> {
        Ok(CompanyBatchHeader {
            service_class_code: raw.take("service_class_code")?,
            company_name: raw.take("company_name")?,
            company_discretionary_data: raw.take("company_discretionary_data")?,
            company_id: raw.take("company_id")?,
            standard_entry_class: raw.take("standard_entry_class")?,
            company_entry_description: raw.take("company_entry_description")?,
            company_descriptive_date: raw.take("company_descriptive_date")?,
            effective_entry_date: raw.take("effective_entry_date")?,
            originating_dfi_id: raw.take("originating_dfi_id")?,
            batch_number: raw.take("batch_number")?,
        })
    }
}

/// One debit or credit to a receiver's account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDetail {
    pub transaction_code: TransactionCode,
    /// First 8 digits of the receiving routing number.
    pub receiving_dfi_trn: u64,
    pub receiving_dfi_trn_check_digit: u8,
    pub receiving_dfi_account_number: String,
    pub amount: Amount,
    pub individual_id: String,
    pub individual_name: String,
    pub discretionary_data: String,
    pub addenda_record_indicator: u8,
    pub trace_number: u64,
}

impl EntryDetail {
    /// The full 9-digit routing number.
    pub fn routing_number(&self) -> String {
        format!(
            "{:08}{}",
            self.receiving_dfi_trn, self.receiving_dfi_trn_check_digit
        )
    }

    pub fn has_addenda(&self) -> bool {
        self.addenda_record_indicator == 1
    }
}

impl Record for EntryDetail {
    fn schema() -> &'static Schema {
        &ENTRY_DETAIL
    }

    fn to_raw(&self) -> Result<RawRecord> {
        let mut raw = RawRecord::new(&ENTRY_DETAIL);
        raw.put("transaction_code", &self.transaction_code)?;
        raw.put("receiving_dfi_trn", &self.receiving_dfi_trn)?;
        raw.put("receiving_dfi_trn_check_digit", &self.receiving_dfi_trn_check_digit)?;
        raw.put("receiving_dfi_account_number", &self.receiving_dfi_account_number)?;
        raw.put("amount", &self.amount)?;
        raw.put("individual_id", &self.individual_id)?;
        raw.put("individual_name", &self.individual_name)?;
        raw.put("discretionary_data", &self.discretionary_data)?;
        raw.put("addenda_record_indicator", &self.addenda_record_indicator)?;
        raw.put("trace_number", &self.trace_number)?;
        Ok(raw)
    }

    fn from_raw(mut raw: RawRecord) -> Result<Self> {
        Ok(EntryDetail {
            transaction_code: raw.take("transaction_code")?,
            receiving_dfi_trn: raw.take("receiving_dfi_trn")?,
            receiving_dfi_trn_check_digit: raw.take("receiving_dfi_trn_check_digit")?,
            receiving_dfi_account_number: raw.take("receiving_dfi_account_number")?,
            amount: raw.take("amount")?,
            individual_id: raw.take("individual_id")?,
            individual_name: raw.take("individual_name")?,
            discretionary_data: raw.take("discretionary_data")?,
            addenda_record_indicator: raw.take("addenda_record_indicator")?,
            trace_number: raw.take("trace_number")?,
        })
    }
}

/// Free-form remittance text attached to the preceding entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDetailAddendum {
    pub payment_related_information: String,
    pub addenda_sequence_number: u64,
    pub entry_detail_sequence_number: u64,
}

impl Record for EntryDetailAddendum {
    fn schema() -> &'static Schema {
        &ENTRY_DETAIL_ADDENDUM
    }

    fn to_raw(&self) -> Result<RawRecord> {
        let mut raw = RawRecord::new(&ENTRY_DETAIL_ADDENDUM);
        raw.put("payment_related_information", &self.payment_related_information)?;
        raw.put("addenda_sequence_number", &self.addenda_sequence_number)?;
        raw.put("entry_detail_sequence_number", &self.entry_detail_sequence_number)?;
        Ok(raw)
    }

    fn from_raw(mut raw: RawRecord) -> Result<Self> {
        Ok(EntryDetailAddendum {
            payment_related_information: raw.take("payment_related_information")?,
            addenda_sequence_number: raw.take("addenda_sequence_number")?,
            entry_detail_sequence_number: raw.take("entry_detail_sequence_number")?,
        })
    }
}

/// Closes a batch with totals over its entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyBatchControl {
    pub service_class_code: ServiceClassCode,
    pub entry_addenda_count: u64,
    pub entry_hash: u64,
    pub total_batch_debit_entry_amount: Amount,
    pub total_batch_credit_entry_amount: Amount,
    pub company_id: String,
    pub originating_dfi_id: u64,
    pub batch_number: u64,
}

impl Record for CompanyBatchControl {
    fn schema() -> &'static Schema {
        &COMPANY_BATCH_CONTROL
    }

    fn to_raw(&self) -> Result<RawRecord> {
        let mut raw = RawRecord::new(&COMPANY_BATCH_CONTROL);
        raw.put("service_class_code", &self.service_class_code)?;
        raw.put("entry_addenda_count", &self.entry_addenda_count)?;
        raw.put("entry_hash", &self.entry_hash)?;
        raw.put("total_batch_debit_entry_amount", &self.total_batch_debit_entry_amount)?;
        raw.put("total_batch_credit_entry_amount", &self.total_batch_credit_entry_amount)?;
        raw.put("company_id", &self.company_id)?;
        raw.put("originating_dfi_id", &self.originating_dfi_id)?;
        raw.put("batch_number", &self.batch_number)?;
        Ok(raw)
    }

    fn from_raw(mut raw: RawRecord) -> Result<Self> {
        Ok(CompanyBatchControl {
            service_class_code: raw.take("service_class_code")?,
            entry_addenda_count: raw.take("entry_addenda_count")?,
            entry_hash: raw.take("entry_hash")?,
            total_batch_debit_entry_amount: raw.take("total_batch_debit_entry_amount")?,
            total_batch_credit_entry_amount: raw.take("total_batch_credit_entry_amount")?,
            company_id: raw.take("company_id")?,
            originating_dfi_id: raw.take("originating_dfi_id")?,
            batch_number: raw.take("batch_number")?,
        })
    }
}

/// Closes the file with totals over every batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileControl {
    pub batch_count: u64,
    pub block_count: u64,
    pub entry_addenda_record_count: u64,
    pub entry_hash_total: u64,
    pub total_file_debit_entry_amount: Amount,
    pub total_file_credit_entry_amount: Amount,
}

impl Record for FileControl {
    fn schema() -> &'static Schema {
        &FILE_CONTROL
    }

    fn to_raw(&self) -> Result<RawRecord> {
        let mut raw = RawRecord::new(&FILE_CONTROL);
        raw.put("batch_count", &self.batch_count)?;
        raw.put("block_count", &self.block_count)?;
        raw.put("entry_addenda_record_count", &self.entry_addenda_record_count)?;
        raw.put("entry_hash_total", &self.entry_hash_total)?;
        raw.put("total_file_debit_entry_amount", &self.total_file_debit_entry_amount)?;
        raw.put("total_file_credit_entry_amount", &self.total_file_credit_entry_amount)?;
        Ok(raw)
    }

    fn from_raw(mut raw: RawRecord) -> Result<Self> {
        Ok(FileControl {
            batch_count: raw.take("batch_count")?,
            block_count: raw.take("block_count")?,
            entry_addenda_record_count: raw.take("entry_addenda_record_count")?,
            entry_hash_total: raw.take("entry_hash_total")?,
            total_file_debit_entry_amount: raw.take("total_file_debit_entry_amount")?,
            total_file_credit_entry_amount: raw.take("total_file_credit_entry_amount")?,
        })
    }
}

/// Any one line of an ACH file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AchRecord {
    FileHeader(FileHeader),
    CompanyBatchHeader(CompanyBatchHeader),
    EntryDetail(EntryDetail),
    EntryDetailAddendum(EntryDetailAddendum),
    CompanyBatchControl(CompanyBatchControl),
    FileControl(FileControl),
}

impl AchRecord {
    /// Parses a line, choosing the layout by its first character.
    pub fn from_line(line: &str) -> Result<Self> {
        let code = line
            .chars()
            .next()
            .ok_or_else(|| NachaError::InvalidInput("empty line".to_string()))?;
        let &(schema, decode) = CATALOG
            .iter()
            .find(|(schema, _)| schema.type_code() == Some(code))
            .ok_or_else(|| {
                NachaError::InvalidInput(format!("unknown record type {:?}", code))
            })?;
        decode(RawRecord::load(schema, line)?)
    }

    pub fn schema(&self) -> &'static Schema {
        match self {
            AchRecord::FileHeader(_) => &FILE_HEADER,
            AchRecord::CompanyBatchHeader(_) => &COMPANY_BATCH_HEADER,
            AchRecord::EntryDetail(_) => &ENTRY_DETAIL,
            AchRecord::EntryDetailAddendum(_) => &ENTRY_DETAIL_ADDENDUM,
            AchRecord::CompanyBatchControl(_) => &COMPANY_BATCH_CONTROL,
            AchRecord::FileControl(_) => &FILE_CONTROL,
        }
    }

    pub fn name(&self) -> &'static str {
        self.schema().name
    }

    pub fn dump(&self) -> Result<String> {
        match self {
            AchRecord::FileHeader(r) => r.dump(),
            AchRecord::CompanyBatchHeader(r) => r.dump(),
            AchRecord::EntryDetail(r) => r.dump(),
            AchRecord::EntryDetailAddendum(r) => r.dump(),
            AchRecord::CompanyBatchControl(r) => r.dump(),
            AchRecord::FileControl(r) => r.dump(),
        }
    }
}

impl From<FileHeader> for AchRecord {
    fn from(record: FileHeader) -> Self {
        AchRecord::FileHeader(record)
    }
}

impl From<CompanyBatchHeader> for AchRecord {
    fn from(record: CompanyBatchHeader) -> Self {
        AchRecord::CompanyBatchHeader(record)
    }
}

impl From<EntryDetail> for AchRecord {
    fn from(record: EntryDetail) -> Self {
        AchRecord::EntryDetail(record)
    }
}

impl From<EntryDetailAddendum> for AchRecord {
    fn from(record: EntryDetailAddendum) -> Self {
        AchRecord::EntryDetailAddendum(record)
    }
}

impl From<CompanyBatchControl> for AchRecord {
    fn from(record: CompanyBatchControl) -> Self {
        AchRecord::CompanyBatchControl(record)
    }
}

impl From<FileControl> for AchRecord {
    fn from(record: FileControl) -> Self {
        AchRecord::FileControl(record)
    }
}
