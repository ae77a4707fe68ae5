//! Hierarchical ACH file writer.
//!
//! Scopes nest as file → company batch → entry and are tracked on a LIFO
//! stack; only the innermost open scope may be closed. Headers are written
//! when a scope opens, entries when they close, and control records once
//! their totals are final. Nothing already written is ever revisited.
//!
//! Closing a scope with an in-flight error pops it without writing its record
//! and without touching any totals, so a file never carries a control record
//! that disagrees with its content.

use crate::amount::Amount;
use crate::codes::{ServiceClassCode, TransactionCode};
use crate::error::{NachaError, Result};
use crate::records::{
    CompanyBatchHeader, EntryDetail, EntryDetailAddendum, FileControl, FileHeader, BLOCKING_FACTOR,
};
use crate::schema::Record;
use crate::totals::{ControlTotals, RoutingNumber};
use chrono::{Local, NaiveDate, NaiveDateTime};
use log::{debug, warn};
use std::error::Error as StdError;
use std::fmt;
use std::io::Write;

/// Largest running entry index that fits the 7-digit trace suffix.
const MAX_ENTRY_INDEX: u64 = 9_999_999;

/// How the FileControl block count is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockAccounting {
    /// One block per closed batch plus one for the file control record.
    #[default]
    PerBatch,
    /// Every record written, rounded up to whole blocks of ten.
    Physical,
}

/// Output settings for a [`Writer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    pub line_terminator: String,
    pub block_accounting: BlockAccounting,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            line_terminator: "\n".to_string(),
            block_accounting: BlockAccounting::default(),
        }
    }
}

/// Arguments for [`Writer::begin_file`].
#[derive(Debug, Clone, Default)]
pub struct NewFile {
    pub immediate_destination: u64,
    pub immediate_destination_name: String,
    pub immediate_origin: String,
    pub immediate_origin_name: String,
    /// Defaults to the local time when the file is opened.
    pub created_at: Option<NaiveDateTime>,
    /// Defaults to `'A'`.
    pub file_id_modifier: Option<char>,
    pub reference_code: Option<String>,
}

/// Arguments for [`Writer::begin_company_batch`].
#[derive(Debug, Clone)]
pub struct NewCompanyBatch {
    pub service_class_code: ServiceClassCode,
    pub company_name: String,
    pub company_discretionary_data: Option<String>,
    pub company_id: String,
    pub standard_entry_class: String,
    pub company_entry_description: String,
    pub company_descriptive_date: Option<String>,
    /// Defaults to the file creation date.
    pub effective_entry_date: Option<NaiveDate>,
    pub originating_dfi_id: u64,
}

/// Arguments for [`Writer::begin_entry`].
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub transaction_code: TransactionCode,
    /// Exactly 9 digits, check digit included.
    pub receiving_dfi_routing_number: String,
    pub receiving_dfi_account_number: String,
    pub amount: Amount,
    pub individual_id: String,
    pub individual_name: String,
    pub discretionary_data: Option<String>,
    /// Derived from the originating DFI and the running entry index if unset.
    pub trace_number: Option<u64>,
}

/// A token for one open scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    File,
    CompanyBatch,
    Entry,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::File => f.write_str("file"),
            Scope::CompanyBatch => f.write_str("company batch"),
            Scope::Entry => f.write_str("entry"),
        }
    }
}

struct OpenFile {
    created_on: NaiveDate,
    totals: ControlTotals,
    batch_count: u64,
    block_count: u64,
    records_written: u64,
}

struct OpenBatch {
    header: CompanyBatchHeader,
    totals: ControlTotals,
    entry_count: u64,
}

struct OpenEntry {
    detail: EntryDetail,
    addenda: Vec<EntryDetailAddendum>,
}

/// Writes one ACH file to a caller-owned sink.
///
/// The writer never closes the sink; use [`Writer::into_inner`] to get it
/// back. One instance writes one file at a time and is not meant to be
/// shared between threads.
pub struct Writer<W: Write> {
    out: W,
    config: WriterConfig,
    scopes: Vec<Scope>,
    file: Option<OpenFile>,
    batch: Option<OpenBatch>,
    entry: Option<OpenEntry>,
    next_batch_number: u64,
    next_entry_index: u64,
}

impl<W: Write> Writer<W> {
    pub fn new(out: W) -> Self {
        Self::with_config(out, WriterConfig::default())
    }

    pub fn with_config(out: W, config: WriterConfig) -> Self {
        Writer {
            out,
            config,
            scopes: Vec::new(),
            file: None,
            batch: None,
            entry: None,
            next_batch_number: 1,
            next_entry_index: 1,
        }
    }

    /// Number of scopes currently open.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Writes the FileHeader and opens the file scope.
    pub fn begin_file(&mut self, file: NewFile) -> Result<()> {
        self.require(None, "begin a file")?;

        let created_at = file
            .created_at
            .unwrap_or_else(|| Local::now().naive_local());
        let header = FileHeader {
            immediate_destination: file.immediate_destination,
            immediate_origin: file.immediate_origin,
            file_creation_date: created_at.date(),
            file_creation_time: created_at.time(),
            file_id_modifier: file.file_id_modifier.unwrap_or('A'),
            immediate_destination_name: file.immediate_destination_name,
            immediate_origin_name: file.immediate_origin_name,
            reference_code: file.reference_code.unwrap_or_default(),
        };

        self.next_entry_index = 1;
        self.file = Some(OpenFile {
            created_on: created_at.date(),
            totals: ControlTotals::new(),
            batch_count: 0,
            block_count: 0,
            records_written: 0,
        });
        if let Err(e) = self.emit(&header) {
            self.file = None;
            return Err(e);
        }
        self.scopes.push(Scope::File);
        debug!("Opened file for {}", header.immediate_destination_name);
        Ok(())
    }

    /// Writes a CompanyBatchHeader and opens a batch scope.
    ///
    /// Batch numbers are allocated before anything is written and are never
    /// reused, even if the batch is later aborted.
    pub fn begin_company_batch(&mut self, batch: NewCompanyBatch) -> Result<()> {
        self.require(Some(Scope::File), "begin a company batch")?;

        let batch_number = self.next_batch_number;
        self.next_batch_number += 1;

        let created_on = self.open_file()?.created_on;
        let header = CompanyBatchHeader {
            service_class_code: batch.service_class_code,
            company_name: batch.company_name,
            company_discretionary_data: batch.company_discretionary_data.unwrap_or_default(),
            company_id: batch.company_id,
            standard_entry_class: batch.standard_entry_class,
            company_entry_description: batch.company_entry_description,
            company_descriptive_date: batch.company_descriptive_date.unwrap_or_default(),
            effective_entry_date: Some(batch.effective_entry_date.unwrap_or(created_on)),
            originating_dfi_id: batch.originating_dfi_id,
            batch_number,
        };

        self.emit(&header)?;
        debug!("Opened company batch {}", batch_number);
        self.batch = Some(OpenBatch {
            header,
            totals: ControlTotals::new(),
            entry_count: 0,
        });
        self.scopes.push(Scope::CompanyBatch);
        Ok(())
    }

    /// Opens an entry scope. The entry is written when the scope closes.
    pub fn begin_entry(&mut self, entry: NewEntry) -> Result<()> {
        self.require(Some(Scope::CompanyBatch), "begin an entry")?;

        let routing: RoutingNumber = entry.receiving_dfi_routing_number.parse()?;
        let index = self.next_entry_index;
        let trace_number = match entry.trace_number {
            Some(trace_number) => trace_number,
            None => {
                if index > MAX_ENTRY_INDEX {
                    return Err(NachaError::InvalidInput(format!(
                        "entry index {} does not fit a trace number",
                        index
                    )));
                }
                self.open_batch()?.header.originating_dfi_id * (MAX_ENTRY_INDEX + 1) + index
            }
        };

        let detail = EntryDetail {
            transaction_code: entry.transaction_code,
            receiving_dfi_trn: routing.prefix,
            receiving_dfi_trn_check_digit: routing.check_digit,
            receiving_dfi_account_number: entry.receiving_dfi_account_number,
            amount: entry.amount,
            individual_id: entry.individual_id,
            individual_name: entry.individual_name,
            discretionary_data: entry.discretionary_data.unwrap_or_default(),
            addenda_record_indicator: 0,
            trace_number,
        };
        detail.dump()?;

        self.next_entry_index += 1;
        self.entry = Some(OpenEntry {
            detail,
            addenda: Vec::new(),
        });
        self.scopes.push(Scope::Entry);
        Ok(())
    }

    /// Buffers an addendum on the open entry, numbered by position.
    pub fn entry_addendum(&mut self, payment_related_information: impl Into<String>) -> Result<()> {
        self.require(Some(Scope::Entry), "add an addendum")?;
        let entry = self.open_entry()?;

        let addendum = EntryDetailAddendum {
            payment_related_information: payment_related_information.into(),
            addenda_sequence_number: entry.addenda.len() as u64 + 1,
            entry_detail_sequence_number: entry.detail.trace_number % (MAX_ENTRY_INDEX + 1),
        };
        addendum.dump()?;
        entry.addenda.push(addendum);
        Ok(())
    }

    /// Closes the open entry, writing it and its addenda unless `error` is set.
    pub fn end_entry(&mut self, error: Option<&dyn StdError>) -> Result<()> {
        self.pop(Scope::Entry)?;
        let OpenEntry {
            mut detail,
            addenda,
        } = self.entry.take().ok_or_else(|| missing(Scope::Entry))?;

        if let Some(e) = error {
            warn!("Discarding entry {}: {}", detail.trace_number, e);
            return Ok(());
        }

        detail.addenda_record_indicator = u8::from(!addenda.is_empty());

        // the batch control must still pack once this entry is counted
        let batch = self.open_batch()?;
        let mut totals = batch.totals;
        totals.add_entry(&detail, addenda.len());
        if let Err(e) = totals.batch_control(&batch.header).dump() {
            warn!("Discarding entry {}: {}", detail.trace_number, e);
            return Err(e);
        }

        self.emit(&detail)?;
        for addendum in &addenda {
            self.emit(addendum)?;
        }

        let batch = self.open_batch()?;
        batch.totals = totals;
        batch.entry_count += 1;
        self.open_file()?.totals.add_entry(&detail, addenda.len());
        debug!(
            "Wrote entry {} with {} addenda",
            detail.trace_number,
            addenda.len()
        );
        Ok(())
    }

    /// Closes the open batch, writing its control record unless `error` is set.
    pub fn end_company_batch(&mut self, error: Option<&dyn StdError>) -> Result<()> {
        self.pop(Scope::CompanyBatch)?;
        let batch = self.batch.take().ok_or_else(|| missing(Scope::CompanyBatch))?;

        if let Some(e) = error {
            warn!(
                "Discarding control for company batch {}: {}",
                batch.header.batch_number, e
            );
            return Ok(());
        }
        if batch.entry_count == 0 {
            warn!("Company batch {} has no entries", batch.header.batch_number);
            return Err(NachaError::Context(format!(
                "cannot close company batch {} without entries",
                batch.header.batch_number
            )));
        }

        let control = batch.totals.batch_control(&batch.header);
        self.emit(&control)?;

        let file = self.open_file()?;
        file.batch_count += 1;
        file.block_count += 1;
        debug!("Closed company batch {}", batch.header.batch_number);
        Ok(())
    }

    /// Closes the file, writing the FileControl unless `error` is set.
    pub fn end_file(&mut self, error: Option<&dyn StdError>) -> Result<()> {
        self.pop(Scope::File)?;
        let file = self.file.take().ok_or_else(|| missing(Scope::File))?;

        if let Some(e) = error {
            warn!("Discarding file control: {}", e);
            return Ok(());
        }
        if file.batch_count == 0 {
            warn!("File has no company batches");
            return Err(NachaError::Context(
                "cannot close a file without company batches".to_string(),
            ));
        }

        let block_count = match self.config.block_accounting {
            BlockAccounting::PerBatch => file.block_count + 1,
            BlockAccounting::Physical => (file.records_written + 1).div_ceil(BLOCKING_FACTOR),
        };
        let control = FileControl {
            batch_count: file.batch_count,
            block_count,
            entry_addenda_record_count: file.totals.entry_addenda_count,
            entry_hash_total: file.totals.entry_hash,
            total_file_debit_entry_amount: file.totals.debit,
            total_file_credit_entry_amount: file.totals.credit,
        };
        self.emit(&control)?;
        self.out.flush()?;
        debug!(
            "Closed file: {} batches, {} entry/addenda records",
            control.batch_count, control.entry_addenda_record_count
        );
        Ok(())
    }

    /// Writes a single entry without addenda.
    pub fn entry(&mut self, entry: NewEntry) -> Result<()> {
        self.begin_entry(entry)?;
        self.end_entry(None)
    }

    /// Runs `body` inside a file scope, closing it with `body`'s outcome.
    pub fn file<T, E, F>(&mut self, file: NewFile, body: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Self) -> std::result::Result<T, E>,
        E: StdError + From<NachaError>,
    {
        self.begin_file(file)?;
        self.scoped(Scope::File, body)
    }

    /// Runs `body` inside a company batch scope.
    pub fn company_batch<T, E, F>(
        &mut self,
        batch: NewCompanyBatch,
        body: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Self) -> std::result::Result<T, E>,
        E: StdError + From<NachaError>,
    {
        self.begin_company_batch(batch)?;
        self.scoped(Scope::CompanyBatch, body)
    }

    /// Runs `body` inside an entry scope, typically to add addenda.
    pub fn entry_with<T, E, F>(&mut self, entry: NewEntry, body: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Self) -> std::result::Result<T, E>,
        E: StdError + From<NachaError>,
    {
        self.begin_entry(entry)?;
        self.scoped(Scope::Entry, body)
    }

    fn scoped<T, E, F>(&mut self, scope: Scope, body: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Self) -> std::result::Result<T, E>,
        E: StdError + From<NachaError>,
    {
        let depth = self.scopes.len();
        match body(self) {
            Ok(value) => {
                self.close(scope, None)?;
                Ok(value)
            }
            Err(e) => {
                // scopes the body left open are discarded along with this one
                while self.scopes.len() > depth {
                    if let Some(&inner) = self.scopes.last() {
                        self.close(inner, Some(&e))?;
                    }
                }
                self.close(scope, Some(&e))?;
                Err(e)
            }
        }
    }

    fn close(&mut self, scope: Scope, error: Option<&dyn StdError>) -> Result<()> {
        match scope {
            Scope::File => self.end_file(error),
            Scope::CompanyBatch => self.end_company_batch(error),
            Scope::Entry => self.end_entry(error),
        }
    }

    fn require(&self, parent: Option<Scope>, action: &str) -> Result<()> {
        let message = match (parent, self.scopes.last().copied()) {
            (None, None) => return Ok(()),
            (Some(needed), Some(open)) if needed == open => return Ok(()),
            (None, Some(open)) => format!("cannot {} while a {} is open", action, open),
            (Some(needed), Some(open)) if self.scopes.contains(&needed) => {
                format!("cannot {} while an inner {} is open", action, open)
            }
            (Some(needed), _) => format!("cannot {} outside of a {}", action, needed),
        };
        Err(NachaError::Context(message))
    }

    fn pop(&mut self, scope: Scope) -> Result<()> {
        match self.scopes.last() {
            Some(&open) if open == scope => {
                self.scopes.pop();
                Ok(())
            }
            Some(&open) => Err(NachaError::Context(format!(
                "cannot close {} while {} is open",
                scope, open
            ))),
            None => Err(NachaError::Context(format!("no {} is open", scope))),
        }
    }

    fn open_file(&mut self) -> Result<&mut OpenFile> {
        self.file.as_mut().ok_or_else(|| missing(Scope::File))
    }

    fn open_batch(&mut self) -> Result<&mut OpenBatch> {
        self.batch.as_mut().ok_or_else(|| missing(Scope::CompanyBatch))
    }

    fn open_entry(&mut self) -> Result<&mut OpenEntry> {
        self.entry.as_mut().ok_or_else(|| missing(Scope::Entry))
    }

    /// Serializes a record in full, then appends it and one terminator.
    fn emit<R: Record>(&mut self, record: &R) -> Result<()> {
        let line = record.dump()?;
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(self.config.line_terminator.as_bytes())?;
        if let Some(file) = self.file.as_mut() {
            file.records_written += 1;
        }
        debug!("Wrote {} record", R::schema().name);
        Ok(())
    }
}

fn missing(scope: Scope) -> NachaError {
    NachaError::Context(format!("no {} is open", scope))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::standard_entry_class;
    use chrono::NaiveDate;

    fn new_file() -> NewFile {
        NewFile {
            immediate_destination: 91000019,
            immediate_destination_name: "WELLS FARGO".to_string(),
            immediate_origin: "1273720697".to_string(),
            immediate_origin_name: "ALALALAD PAYMENTS".to_string(),
            created_at: NaiveDate::from_ymd_opt(2013, 1, 16)
                .unwrap()
                .and_hms_opt(15, 5, 0),
            ..NewFile::default()
        }
    }

    fn new_batch() -> NewCompanyBatch {
        NewCompanyBatch {
            service_class_code: ServiceClassCode::MIXED,
            company_name: "ALALALAD".to_string(),
            company_discretionary_data: Some("ACH Settlement".to_string()),
            company_id: "2273720697".to_string(),
            standard_entry_class: standard_entry_class::PPD.to_string(),
            company_entry_description: "payouts".to_string(),
            company_descriptive_date: None,
            effective_entry_date: None,
            originating_dfi_id: 12737206,
        }
    }

    fn credit(routing: &str, cents: u64) -> NewEntry {
        NewEntry {
            transaction_code: TransactionCode::CHECKING_CREDIT,
            receiving_dfi_routing_number: routing.to_string(),
            receiving_dfi_account_number: "1123456789".to_string(),
            amount: Amount::from_cents(cents),
            individual_id: "98789789".to_string(),
            individual_name: "Test Credit".to_string(),
            discretionary_data: None,
            trace_number: None,
        }
    }

    fn lines(writer: Writer<Vec<u8>>) -> Vec<String> {
        String::from_utf8(writer.into_inner())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_entry_before_batch_is_a_context_error() {
        let mut writer = Writer::new(Vec::new());
        writer.begin_file(new_file()).unwrap();
        let err = writer.begin_entry(credit("112345678", 1)).unwrap_err();
        assert!(matches!(err, NachaError::Context(_)));
        assert_eq!(writer.depth(), 1);
    }

    #[test]
    fn test_batch_before_file_is_a_context_error() {
        let mut writer = Writer::new(Vec::new());
        assert!(matches!(
            writer.begin_company_batch(new_batch()),
            Err(NachaError::Context(_))
        ));
    }

    #[test]
    fn test_close_out_of_order_fails() {
        let mut writer = Writer::new(Vec::new());
        writer.begin_file(new_file()).unwrap();
        writer.begin_company_batch(new_batch()).unwrap();
        writer.begin_entry(credit("112345678", 1)).unwrap();

        assert!(matches!(
            writer.end_company_batch(None),
            Err(NachaError::Context(_))
        ));
        assert!(matches!(writer.end_file(None), Err(NachaError::Context(_))));
        assert_eq!(writer.depth(), 3);

        writer.end_entry(None).unwrap();
        writer.end_company_batch(None).unwrap();
        writer.end_file(None).unwrap();
        assert_eq!(writer.depth(), 0);
        assert!(matches!(writer.end_file(None), Err(NachaError::Context(_))));
    }

    #[test]
    fn test_bad_routing_number_is_input_error() {
        let mut writer = Writer::new(Vec::new());
        writer.begin_file(new_file()).unwrap();
        writer.begin_company_batch(new_batch()).unwrap();
        let err = writer.begin_entry(credit("12345", 1)).unwrap_err();
        assert!(matches!(err, NachaError::InvalidInput(_)));
        assert_eq!(writer.depth(), 2);
    }

    #[test]
    fn test_auto_trace_number() {
        let mut writer = Writer::new(Vec::new());
        writer.begin_file(new_file()).unwrap();
        writer.begin_company_batch(new_batch()).unwrap();
        writer.entry(credit("112345678", 12345)).unwrap();

        let out = String::from_utf8(writer.get_ref().clone()).unwrap();
        let detail = EntryDetail::load(out.lines().nth(2).unwrap()).unwrap();
        assert_eq!(detail.trace_number, 127372060000001);
    }

    #[test]
    fn test_addenda_are_numbered_and_flagged() {
        let mut writer = Writer::new(Vec::new());
        writer.begin_file(new_file()).unwrap();
        writer.begin_company_batch(new_batch()).unwrap();
        writer.begin_entry(credit("112345678", 100)).unwrap();
        writer.entry_addendum("first").unwrap();
        writer.entry_addendum("second").unwrap();
        writer.end_entry(None).unwrap();
        writer.end_company_batch(None).unwrap();
        writer.end_file(None).unwrap();

        let lines = lines(writer);
        assert_eq!(lines.len(), 7);
        let detail = EntryDetail::load(&lines[2]).unwrap();
        assert_eq!(detail.addenda_record_indicator, 1);
        let first = EntryDetailAddendum::load(&lines[3]).unwrap();
        let second = EntryDetailAddendum::load(&lines[4]).unwrap();
        assert_eq!(first.addenda_sequence_number, 1);
        assert_eq!(second.addenda_sequence_number, 2);
        assert_eq!(second.entry_detail_sequence_number, 1);

        let control = crate::records::CompanyBatchControl::load(&lines[5]).unwrap();
        assert_eq!(control.entry_addenda_count, 3);
    }

    #[test]
    fn test_aborted_entry_leaves_totals_untouched() {
        let mut writer = Writer::new(Vec::new());
        writer.begin_file(new_file()).unwrap();
        writer.begin_company_batch(new_batch()).unwrap();
        writer.entry(credit("112345678", 12345)).unwrap();
        writer.begin_entry(credit("131541348", 999)).unwrap();
        let failure = NachaError::InvalidInput("upstream failure".to_string());
        writer.end_entry(Some(&failure)).unwrap();
        writer.end_company_batch(None).unwrap();
        writer.end_file(None).unwrap();

        let lines = lines(writer);
        assert_eq!(lines.len(), 5);
        let control = FileControl::load(&lines[4]).unwrap();
        assert_eq!(control.entry_addenda_record_count, 1);
        assert_eq!(control.entry_hash_total, 11234567);
        assert_eq!(control.total_file_credit_entry_amount, Amount::from_cents(12345));
    }

    #[test]
    fn test_aborted_batch_keeps_its_number() {
        let mut writer = Writer::new(Vec::new());
        writer.begin_file(new_file()).unwrap();
        writer.begin_company_batch(new_batch()).unwrap();
        let failure = NachaError::InvalidInput("abandoned".to_string());
        writer.end_company_batch(Some(&failure)).unwrap();
        writer.begin_company_batch(new_batch()).unwrap();
        writer.entry(credit("112345678", 100)).unwrap();
        writer.end_company_batch(None).unwrap();
        writer.end_file(None).unwrap();

        let lines = lines(writer);
        let second = CompanyBatchHeader::load(&lines[2]).unwrap();
        assert_eq!(second.batch_number, 2);
        let control = FileControl::load(lines.last().unwrap()).unwrap();
        assert_eq!(control.batch_count, 1);
        assert_eq!(control.block_count, 2);
    }

    #[test]
    fn test_scoped_error_discards_inner_scopes() {
        let mut writer = Writer::new(Vec::new());
        let result: Result<()> = writer.file(new_file(), |w| {
            w.company_batch(new_batch(), |w| {
                w.begin_entry(credit("112345678", 1))?;
                Err(NachaError::InvalidInput("boom".to_string()))
            })
        });
        assert!(result.is_err());
        assert_eq!(writer.depth(), 0);

        let lines = lines(writer);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('1'));
        assert!(lines[1].starts_with('5'));
    }

    #[test]
    fn test_physical_block_accounting() {
        let config = WriterConfig {
            block_accounting: BlockAccounting::Physical,
            ..WriterConfig::default()
        };
        let mut writer = Writer::with_config(Vec::new(), config);
        writer
            .file(new_file(), |w| {
                w.company_batch(new_batch(), |w| {
                    for _ in 0..8 {
                        w.entry(credit("112345678", 1))?;
                    }
                    Ok::<_, NachaError>(())
                })
            })
            .unwrap();

        let lines = lines(writer);
        assert_eq!(lines.len(), 12);
        let control = FileControl::load(lines.last().unwrap()).unwrap();
        assert_eq!(control.block_count, 2);
    }

    #[test]
    fn test_custom_line_terminator() {
        let config = WriterConfig {
            line_terminator: "\r\n".to_string(),
            ..WriterConfig::default()
        };
        let mut writer = Writer::with_config(Vec::new(), config);
        writer.begin_file(new_file()).unwrap();
        let out = writer.get_ref().clone();
        assert_eq!(out.len(), 96);
        assert!(out.ends_with(b"\r\n"));
    }

    #[test]
    fn test_batch_without_entries_cannot_close() {
        let mut writer = Writer::new(Vec::new());
        writer.begin_file(new_file()).unwrap();
        writer.begin_company_batch(new_batch()).unwrap();

        let err = writer.end_company_batch(None).unwrap_err();
        assert!(matches!(err, NachaError::Context(_)));
        assert_eq!(writer.depth(), 1);

        let err = writer.end_file(None).unwrap_err();
        assert!(matches!(err, NachaError::Context(_)));
        assert_eq!(writer.depth(), 0);

        let lines = lines(writer);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with('5'));
    }

    #[test]
    fn test_file_without_batches_cannot_close() {
        let mut writer = Writer::new(Vec::new());
        writer.begin_file(new_file()).unwrap();
        assert!(matches!(writer.end_file(None), Err(NachaError::Context(_))));
        assert_eq!(writer.depth(), 0);

        let result: Result<()> = writer.file(new_file(), |_| Ok(()));
        assert!(matches!(result, Err(NachaError::Context(_))));
        assert_eq!(writer.depth(), 0);

        let lines = lines(writer);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| line.starts_with('1')));
    }

    #[test]
    fn test_context_error_messages() {
        let mut writer = Writer::new(Vec::new());
        let err = writer.begin_entry(credit("112345678", 1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "context error: cannot begin an entry outside of a company batch"
        );

        writer.begin_file(new_file()).unwrap();
        let err = writer.begin_file(new_file()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "context error: cannot begin a file while a file is open"
        );

        writer.begin_company_batch(new_batch()).unwrap();
        writer.begin_entry(credit("112345678", 1)).unwrap();
        let err = writer.begin_company_batch(new_batch()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "context error: cannot begin a company batch while an inner entry is open"
        );
    }

    #[test]
    fn test_entry_overflowing_batch_control_is_not_written() {
        let largest = 9_999_999_999;
        let mut writer = Writer::new(Vec::new());
        writer.begin_file(new_file()).unwrap();
        writer.begin_company_batch(new_batch()).unwrap();
        for _ in 0..100 {
            writer.entry(credit("112345678", largest)).unwrap();
        }

        let err = writer.entry(credit("112345678", largest)).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("CompanyBatchControl.total_batch_credit_entry_amount"));
        assert_eq!(writer.depth(), 2);

        writer.end_company_batch(None).unwrap();
        writer.end_file(None).unwrap();

        let lines = lines(writer);
        assert_eq!(lines.len(), 1 + 1 + 100 + 1 + 1);
        let batch = crate::records::CompanyBatchControl::load(&lines[102]).unwrap();
        let file = FileControl::load(&lines[103]).unwrap();
        assert_eq!(batch.entry_addenda_count, 100);
        assert_eq!(file.entry_addenda_record_count, 100);
        assert_eq!(
            file.total_file_credit_entry_amount,
            Amount::from_cents(100 * largest)
        );
    }
}
