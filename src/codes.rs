//! Named code values used by batch headers and entry details.
//!
//! Each type is a thin wrapper over the raw code with associated constants
//! for the well-known values. The domains stay open: any code of the right
//! width is accepted, so files carrying codes missing from these tables still
//! load and dump unchanged.

use crate::field::{Labels, Literal};
use std::fmt;

/// Identifies whether a batch carries credits, debits or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceClassCode(pub u16);

impl ServiceClassCode {
    pub const MIXED: Self = ServiceClassCode(200);
    pub const CREDITS: Self = ServiceClassCode(220);
    pub const DEBITS: Self = ServiceClassCode(225);

    pub const LABELS: Labels = &[
        ("MIXED", Literal::Numeric(200)),
        ("CREDITS", Literal::Numeric(220)),
        ("DEBITS", Literal::Numeric(225)),
    ];

    /// Symbolic name, if the code is a well-known one.
    pub fn name(&self) -> Option<&'static str> {
        label(Self::LABELS, self.0 as u64)
    }
}

impl fmt::Display for ServiceClassCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// How an entry's amount counts towards the control totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDirection {
    Credit,
    Debit,
    /// Returned entries count towards neither total.
    Return,
    Other,
}

/// Two-digit code naming the account type and direction of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionCode(pub u8);

impl TransactionCode {
    pub const CHECKING_CREDIT_RETURN: Self = TransactionCode(21);
    pub const CHECKING_CREDIT: Self = TransactionCode(22);
    pub const CHECKING_CREDIT_PRENOTE: Self = TransactionCode(23);
    pub const CHECKING_DEBIT_RETURN: Self = TransactionCode(26);
    pub const CHECKING_DEBIT: Self = TransactionCode(27);
    pub const CHECKING_DEBIT_PRENOTE: Self = TransactionCode(28);
    pub const SAVINGS_CREDIT_RETURN: Self = TransactionCode(31);
    pub const SAVINGS_CREDIT: Self = TransactionCode(32);
    pub const SAVINGS_CREDIT_PRENOTE: Self = TransactionCode(33);
    pub const SAVINGS_DEBIT_RETURN: Self = TransactionCode(36);
    pub const SAVINGS_DEBIT: Self = TransactionCode(37);
    pub const SAVINGS_DEBIT_PRENOTE: Self = TransactionCode(38);

    pub const LABELS: Labels = &[
        ("CHECKING_CREDIT_RETURN", Literal::Numeric(21)),
        ("CHECKING_CREDIT", Literal::Numeric(22)),
        ("CHECKING_CREDIT_PRENOTE", Literal::Numeric(23)),
        ("CHECKING_DEBIT_RETURN", Literal::Numeric(26)),
        ("CHECKING_DEBIT", Literal::Numeric(27)),
        ("CHECKING_DEBIT_PRENOTE", Literal::Numeric(28)),
        ("SAVINGS_CREDIT_RETURN", Literal::Numeric(31)),
        ("SAVINGS_CREDIT", Literal::Numeric(32)),
        ("SAVINGS_CREDIT_PRENOTE", Literal::Numeric(33)),
        ("SAVINGS_DEBIT_RETURN", Literal::Numeric(36)),
        ("SAVINGS_DEBIT", Literal::Numeric(37)),
        ("SAVINGS_DEBIT_PRENOTE", Literal::Numeric(38)),
    ];

    pub fn name(&self) -> Option<&'static str> {
        label(Self::LABELS, self.0 as u64)
    }

    /// Classifies the code by its trailing digit.
    pub fn direction(&self) -> EntryDirection {
        match self.0 % 10 {
            2 | 3 => EntryDirection::Credit,
            7 | 8 => EntryDirection::Debit,
            1 | 6 => EntryDirection::Return,
            _ => EntryDirection::Other,
        }
    }

    pub fn is_credit(&self) -> bool {
        self.direction() == EntryDirection::Credit
    }

    pub fn is_debit(&self) -> bool {
        self.direction() == EntryDirection::Debit
    }

    pub fn is_prenote(&self) -> bool {
        matches!(self.0 % 10, 3 | 8)
    }
}

impl fmt::Display for TransactionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Three-letter codes describing how an entry was authorized.
pub mod standard_entry_class {
    use crate::field::{Labels, Literal};

    pub const ACK: &str = "ACK";
    pub const ADV: &str = "ADV";
    pub const ARC: &str = "ARC";
    pub const ATX: &str = "ATX";
    pub const BOC: &str = "BOC";
    pub const CCD: &str = "CCD";
    pub const CIE: &str = "CIE";
    pub const COR: &str = "COR";
    pub const CTX: &str = "CTX";
    pub const DNE: &str = "DNE";
    pub const ENR: &str = "ENR";
    pub const IAT: &str = "IAT";
    pub const MTE: &str = "MTE";
    pub const POP: &str = "POP";
    pub const POS: &str = "POS";
    pub const PPD: &str = "PPD";
    pub const RCK: &str = "RCK";
    pub const SHR: &str = "SHR";
    pub const TEL: &str = "TEL";
    pub const TRC: &str = "TRC";
    pub const TRX: &str = "TRX";
    pub const WEB: &str = "WEB";
    pub const XCK: &str = "XCK";

    pub const ALL: [&str; 23] = [
        ACK, ADV, ARC, ATX, BOC, CCD, CIE, COR, CTX, DNE, ENR, IAT, MTE, POP, POS, PPD, RCK,
        SHR, TEL, TRC, TRX, WEB, XCK,
    ];

    pub const LABELS: Labels = &[
        ("ACK", Literal::Text(ACK)),
        ("ADV", Literal::Text(ADV)),
        ("ARC", Literal::Text(ARC)),
        ("ATX", Literal::Text(ATX)),
        ("BOC", Literal::Text(BOC)),
        ("CCD", Literal::Text(CCD)),
        ("CIE", Literal::Text(CIE)),
        ("COR", Literal::Text(COR)),
        ("CTX", Literal::Text(CTX)),
        ("DNE", Literal::Text(DNE)),
        ("ENR", Literal::Text(ENR)),
        ("IAT", Literal::Text(IAT)),
        ("MTE", Literal::Text(MTE)),
        ("POP", Literal::Text(POP)),
        ("POS", Literal::Text(POS)),
        ("PPD", Literal::Text(PPD)),
        ("RCK", Literal::Text(RCK)),
        ("SHR", Literal::Text(SHR)),
        ("TEL", Literal::Text(TEL)),
        ("TRC", Literal::Text(TRC)),
        ("TRX", Literal::Text(TRX)),
        ("WEB", Literal::Text(WEB)),
        ("XCK", Literal::Text(XCK)),
    ];

    /// Returns `true` if `code` is one of the well-known classes.
    pub fn is_known(code: &str) -> bool {
        ALL.contains(&code)
    }
}

fn label(labels: Labels, code: u64) -> Option<&'static str> {
    labels
        .iter()
        .find(|(_, literal)| *literal == Literal::Numeric(code))
        .map(|(name, _)| *name)
}
