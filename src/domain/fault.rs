//! Fault reporting
//!
//! Every failure a strategy hits is reported as `(day, subject, kind, message)`
//! so a replayed run can reproduce the exact failure point. Faults are either
//! recovered locally (the asset or day is skipped) or fatal for the run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultKind {
    InsufficientHistory,
    DivisionByZero,
    NoCointegratedPair,
    InsufficientCandidates,
    /// Panel lookup or numerical failure outside the categories above
    Internal,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaultKind::InsufficientHistory => "InsufficientHistory",
            FaultKind::DivisionByZero => "DivisionByZero",
            FaultKind::NoCointegratedPair => "NoCointegratedPair",
            FaultKind::InsufficientCandidates => "InsufficientCandidates",
            FaultKind::Internal => "Internal",
        };
        f.write_str(name)
    }
}

/// What the fault is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subject {
    Asset(usize),
    Pair(usize, usize),
    Run,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Asset(id) => write!(f, "asset {}", id),
            Subject::Pair(a, b) => write!(f, "pair ({}, {})", a, b),
            Subject::Run => write!(f, "run"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("day {day} | {subject} | {kind}: {message}")]
pub struct Fault {
    pub day: usize,
    pub subject: Subject,
    pub kind: FaultKind,
    pub message: String,
}

impl Fault {
    pub fn new(day: usize, subject: Subject, kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            day,
            subject,
            kind,
            message: message.into(),
        }
    }

    /// Fatal faults abort the run
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, FaultKind::NoCointegratedPair)
    }
}
