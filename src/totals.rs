//! Control totals and routing numbers.
//!
//! Maintains the invariant: a control record's counts, hash and sums are
//! exactly the fold of [`ControlTotals::add_entry`] over the entries it
//! covers. The writer folds entries as they close; verification folds them
//! again over parsed content and compares.

use crate::amount::Amount;
use crate::codes::EntryDirection;
use crate::error::{NachaError, Result};
use crate::records::{CompanyBatchControl, CompanyBatchHeader, EntryDetail};
use std::fmt;
use std::str::FromStr;

/// Entry hashes keep only their ten low-order digits.
pub const ENTRY_HASH_MODULUS: u64 = 10_000_000_000;

/// A 9-digit routing number split into its hashed prefix and check digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingNumber {
    /// The first 8 digits, summed into entry hashes.
    pub prefix: u64,
    pub check_digit: u8,
}

impl FromStr for RoutingNumber {
    type Err = NachaError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim();
        if digits.len() != 9 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NachaError::InvalidInput(format!(
                "routing number {:?} must be exactly 9 digits",
                s
            )));
        }
        let prefix = digits[..8]
            .parse()
            .map_err(|_| NachaError::InvalidInput(format!("routing number {:?}", s)))?;
        let check_digit = digits.as_bytes()[8] - b'0';
        Ok(RoutingNumber {
            prefix,
            check_digit,
        })
    }
}

impl fmt::Display for RoutingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}{}", self.prefix, self.check_digit)
    }
}

/// Running totals over a batch or a whole file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlTotals {
    /// Entries plus their addenda.
    pub entry_addenda_count: u64,
    pub entry_hash: u64,
    pub debit: Amount,
    pub credit: Amount,
}

impl ControlTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one entry and its addenda into the totals.
    ///
    /// Returned entries count towards the hash and record count but towards
    /// neither amount.
    pub fn add_entry(&mut self, entry: &EntryDetail, addenda: usize) {
        match entry.transaction_code.direction() {
            EntryDirection::Debit => self.debit += entry.amount,
            EntryDirection::Credit => self.credit += entry.amount,
            EntryDirection::Return | EntryDirection::Other => {}
        }
        self.entry_addenda_count += 1 + addenda as u64;
        self.entry_hash = (self.entry_hash + entry.receiving_dfi_trn) % ENTRY_HASH_MODULUS;
    }

    /// Builds the control record closing the batch opened by `header`.
    pub fn batch_control(&self, header: &CompanyBatchHeader) -> CompanyBatchControl {
        CompanyBatchControl {
            service_class_code: header.service_class_code,
            entry_addenda_count: self.entry_addenda_count,
            entry_hash: self.entry_hash,
            total_batch_debit_entry_amount: self.debit,
            total_batch_credit_entry_amount: self.credit,
            company_id: header.company_id.clone(),
            originating_dfi_id: header.originating_dfi_id,
            batch_number: header.batch_number,
        }
    }
}
