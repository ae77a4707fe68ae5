//! Line-driven ACH file reader.
//!
//! Lines are parsed one at a time, the first character choosing the layout.
//! Flat mode ([`Reader::records`]) yields every record in file order with no
//! cross-record checks. Structured mode walks the same grammar the writer
//! produces:
//!
//! ```text
//! file_header
//!   company batch header*
//!     (entry detail, addendum*)*
//!   company batch control
//! file_control
//! ```
//!
//! Neither mode recomputes control totals; [`AchFile::verify`] does that on
//! request. There is no resynchronisation: the first bad line ends the read.

use crate::error::{NachaError, Result};
use crate::records::{
    AchRecord, CompanyBatchControl, CompanyBatchHeader, EntryDetail, EntryDetailAddendum,
    FileControl, FileHeader,
};
use crate::schema::Record;
use crate::totals::ControlTotals;
use log::debug;
use std::io::{BufRead, Lines};

/// An entry detail with its trailing addenda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub detail: EntryDetail,
    pub addenda: Vec<EntryDetailAddendum>,
}

/// A batch header, its entries and its control record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyBatch {
    pub header: CompanyBatchHeader,
    pub entries: Vec<Entry>,
    pub control: CompanyBatchControl,
}

/// A whole file read in structured mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchFile {
    pub header: FileHeader,
    pub batches: Vec<CompanyBatch>,
    pub control: FileControl,
}

impl AchFile {
    /// Serializes every record back to its line, in file order.
    pub fn to_lines(&self) -> Result<Vec<String>> {
        let mut lines = vec![self.header.dump()?];
        for batch in &self.batches {
            lines.push(batch.header.dump()?);
            for entry in &batch.entries {
                lines.push(entry.detail.dump()?);
                for addendum in &entry.addenda {
                    lines.push(addendum.dump()?);
                }
            }
            lines.push(batch.control.dump()?);
        }
        lines.push(self.control.dump()?);
        Ok(lines)
    }

    /// Recomputes every control total and compares it with the file.
    ///
    /// Block counts are not checked since they depend on how the file was
    /// blocked.
    pub fn verify(&self) -> Result<()> {
        let mut file_totals = ControlTotals::new();
        if self.batches.is_empty() {
            return Err(mismatch("file has no company batches".to_string()));
        }

        for batch in &self.batches {
            if batch.entries.is_empty() {
                return Err(mismatch(format!(
                    "company batch {} has no entries",
                    batch.header.batch_number
                )));
            }
            let mut totals = ControlTotals::new();
            for entry in &batch.entries {
                let flagged = entry.detail.has_addenda();
                if flagged == entry.addenda.is_empty() {
                    return Err(mismatch(format!(
                        "entry {} addenda indicator {} disagrees with {} addenda",
                        entry.detail.trace_number,
                        entry.detail.addenda_record_indicator,
                        entry.addenda.len()
                    )));
                }
                totals.add_entry(&entry.detail, entry.addenda.len());
                file_totals.add_entry(&entry.detail, entry.addenda.len());
            }

            let expected = totals.batch_control(&batch.header);
            if expected != batch.control {
                return Err(mismatch(format!(
                    "company batch {} control {:?} does not match computed {:?}",
                    batch.header.batch_number, batch.control, expected
                )));
            }
        }

        let control = &self.control;
        let checks = [
            ("batch_count", control.batch_count, self.batches.len() as u64),
            (
                "entry_addenda_record_count",
                control.entry_addenda_record_count,
                file_totals.entry_addenda_count,
            ),
            ("entry_hash_total", control.entry_hash_total, file_totals.entry_hash),
            (
                "total_file_debit_entry_amount",
                control.total_file_debit_entry_amount.cents(),
                file_totals.debit.cents(),
            ),
            (
                "total_file_credit_entry_amount",
                control.total_file_credit_entry_amount.cents(),
                file_totals.credit.cents(),
            ),
        ];
        for (name, found, computed) in checks {
            if found != computed {
                return Err(mismatch(format!(
                    "file control {} is {} but content gives {}",
                    name, found, computed
                )));
            }
        }
        Ok(())
    }
}

fn mismatch(message: String) -> NachaError {
    NachaError::InvalidInput(message)
}

/// Reads records from a caller-owned line source.
pub struct Reader<R: BufRead> {
    source: String,
    lines: Lines<R>,
    line_number: usize,
    pending_line: Option<(usize, String)>,
    peeked: Option<(usize, AchRecord)>,
    failed: bool,
}

impl<R: BufRead> Reader<R> {
    /// `source` names the input in error messages.
    pub fn new(source: impl Into<String>, input: R) -> Self {
        Reader {
            source: source.into(),
            lines: input.lines(),
            line_number: 0,
            pending_line: None,
            peeked: None,
            failed: false,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Flat iteration over `(record, is_last_line)` pairs.
    pub fn records(&mut self) -> Records<'_, R> {
        Records { reader: self }
    }

    /// Reads the FileHeader that must open the file.
    pub fn file_header(&mut self) -> Result<FileHeader> {
        match self.next_record()? {
            Some((_, AchRecord::FileHeader(header))) => Ok(header),
            other => Err(self.unexpected("FileHeader", other)),
        }
    }

    /// Reads the next batch header, or `None` once a different record follows.
    pub fn next_company_batch(&mut self) -> Result<Option<CompanyBatchHeader>> {
        if !matches!(self.peek_record()?, Some(AchRecord::CompanyBatchHeader(_))) {
            return Ok(None);
        }
        match self.next_record()? {
            Some((_, AchRecord::CompanyBatchHeader(header))) => Ok(Some(header)),
            other => Err(self.unexpected("CompanyBatchHeader", other)),
        }
    }

    /// Reads the next entry detail with its addenda, or `None` once a
    /// different record follows.
    pub fn next_entry(&mut self) -> Result<Option<Entry>> {
        if !matches!(self.peek_record()?, Some(AchRecord::EntryDetail(_))) {
            return Ok(None);
        }
        let detail = match self.next_record()? {
            Some((_, AchRecord::EntryDetail(detail))) => detail,
            other => return Err(self.unexpected("EntryDetail", other)),
        };

        let mut addenda = Vec::new();
        while matches!(self.peek_record()?, Some(AchRecord::EntryDetailAddendum(_))) {
            match self.next_record()? {
                Some((_, AchRecord::EntryDetailAddendum(addendum))) => addenda.push(addendum),
                other => return Err(self.unexpected("EntryDetailAddendum", other)),
            }
        }
        Ok(Some(Entry { detail, addenda }))
    }

    /// Lazily yields the entries of the current batch.
    pub fn entries(&mut self) -> Entries<'_, R> {
        Entries {
            reader: self,
            done: false,
        }
    }

    pub fn company_batch_control(&mut self) -> Result<CompanyBatchControl> {
        match self.next_record()? {
            Some((_, AchRecord::CompanyBatchControl(control))) => Ok(control),
            other => Err(self.unexpected("CompanyBatchControl", other)),
        }
    }

    pub fn file_control(&mut self) -> Result<FileControl> {
        match self.next_record()? {
            Some((_, AchRecord::FileControl(control))) => Ok(control),
            other => Err(self.unexpected("FileControl", other)),
        }
    }

    /// Reads one whole batch: header, entries and control.
    pub fn next_company_batch_group(&mut self) -> Result<Option<CompanyBatch>> {
        let header = match self.next_company_batch()? {
            Some(header) => header,
            None => return Ok(None),
        };
        let entries = self.entries().collect::<Result<Vec<_>>>()?;
        if entries.is_empty() {
            let found = self.next_record()?;
            return Err(self.unexpected("EntryDetail", found));
        }
        let control = self.company_batch_control()?;
        debug!(
            "Read company batch {} with {} entries",
            header.batch_number,
            entries.len()
        );
        Ok(Some(CompanyBatch {
            header,
            entries,
            control,
        }))
    }

    /// Lazily yields whole batches until a non-header record follows.
    ///
    /// Each item owns its header, entries and control. Use
    /// [`Reader::next_company_batch`] to walk headers one at a time and read
    /// entries in between.
    pub fn company_batches(&mut self) -> CompanyBatches<'_, R> {
        CompanyBatches {
            reader: self,
            done: false,
        }
    }

    /// Reads the entire file in structured mode.
    pub fn read_file(&mut self) -> Result<AchFile> {
        let header = self.file_header()?;
        let batches = self.company_batches().collect::<Result<Vec<_>>>()?;
        if batches.is_empty() {
            let found = self.next_record()?;
            return Err(self.unexpected("CompanyBatchHeader", found));
        }
        let control = self.file_control()?;
        if let Some((line, record)) = self.next_record()? {
            return Err(self.malformed(
                line,
                format!("unexpected {} after FileControl", record.name()),
            ));
        }
        debug!("Read {} with {} batches", self.source, batches.len());
        Ok(AchFile {
            header,
            batches,
            control,
        })
    }

    fn next_line(&mut self) -> Result<Option<(usize, String)>> {
        if let Some(pending) = self.pending_line.take() {
            return Ok(Some(pending));
        }
        if self.failed {
            return Ok(None);
        }
        match self.lines.next() {
            Some(Ok(line)) => {
                self.line_number += 1;
                Ok(Some((self.line_number, line)))
            }
            Some(Err(e)) => {
                self.failed = true;
                Err(self.malformed(self.line_number + 1, e.to_string()))
            }
            None => Ok(None),
        }
    }

    fn has_more_lines(&mut self) -> Result<bool> {
        if self.peeked.is_some() || self.pending_line.is_some() {
            return Ok(true);
        }
        self.pending_line = self.next_line()?;
        Ok(self.pending_line.is_some())
    }

    fn next_record(&mut self) -> Result<Option<(usize, AchRecord)>> {
        if let Some(peeked) = self.peeked.take() {
            return Ok(Some(peeked));
        }
        let (number, line) = match self.next_line()? {
            Some(next) => next,
            None => return Ok(None),
        };
        match AchRecord::from_line(&line) {
            Ok(record) => {
                debug!("{}:{}: {}", self.source, number, record.name());
                Ok(Some((number, record)))
            }
            Err(e) => {
                self.failed = true;
                self.pending_line = None;
                Err(self.malformed(number, e.to_string()))
            }
        }
    }

    fn peek_record(&mut self) -> Result<Option<&AchRecord>> {
        if self.peeked.is_none() {
            self.peeked = self.next_record()?;
        }
        Ok(self.peeked.as_ref().map(|(_, record)| record))
    }

    fn malformed(&self, line: usize, reason: String) -> NachaError {
        NachaError::Malformed {
            source_name: self.source.clone(),
            line,
            reason,
        }
    }

    fn unexpected(&mut self, expected: &str, found: Option<(usize, AchRecord)>) -> NachaError {
        self.failed = true;
        match found {
            Some((line, record)) => self.malformed(
                line,
                format!("expected {}, found {}", expected, record.name()),
            ),
            None => self.malformed(
                self.line_number + 1,
                format!("expected {}, found end of input", expected),
            ),
        }
    }
}

/// Flat record iterator; see [`Reader::records`].
pub struct Records<'a, R: BufRead> {
    reader: &'a mut Reader<R>,
}

impl<R: BufRead> Iterator for Records<'_, R> {
    type Item = Result<(AchRecord, bool)>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.reader.next_record() {
            Ok(Some((_, record))) => record,
            Ok(None) => return None,
            Err(e) => return Some(Err(e)),
        };
        match self.reader.has_more_lines() {
            Ok(more) => Some(Ok((record, !more))),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Entry iterator; see [`Reader::entries`].
pub struct Entries<'a, R: BufRead> {
    reader: &'a mut Reader<R>,
    done: bool,
}

impl<R: BufRead> Iterator for Entries<'_, R> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.reader.next_entry().transpose();
        if !matches!(next, Some(Ok(_))) {
            self.done = true;
        }
        next
    }
}

/// Batch iterator; see [`Reader::company_batches`].
pub struct CompanyBatches<'a, R: BufRead> {
    reader: &'a mut Reader<R>,
    done: bool,
}

impl<R: BufRead> Iterator for CompanyBatches<'_, R> {
    type Item = Result<CompanyBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.reader.next_company_batch_group().transpose();
        if !matches!(next, Some(Ok(_))) {
            self.done = true;
        }
        next
    }
}
