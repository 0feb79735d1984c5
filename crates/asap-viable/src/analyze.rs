//! `analyzeCase`: the highest-precedence gate reason for why a case is or
//! isn't ready to move forward, in the fixed precedence order the source
//! checks them.

use asap_model::{CaseQcState, ViableCase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateReason {
    NotFound,
    Cancelled,
    NoCaseQc,
    NoSample,
    NotReleased,
    AwaitingResults,
    OrpCoded,
    NoAsapContact,
    MissingAcord103,
    AlreadyTransmitted,
    RestageOutcome,
    Ready,
}

impl GateReason {
    pub fn as_str(self) -> &'static str {
        match self {
            GateReason::NotFound => "not found",
            GateReason::Cancelled => "cancelled",
            GateReason::NoCaseQc => "no caseQC",
            GateReason::NoSample => "no sample",
            GateReason::NotReleased => "not released",
            GateReason::AwaitingResults => "awaiting results",
            GateReason::OrpCoded => "ORP-coded",
            GateReason::NoAsapContact => "no ASAP contact",
            GateReason::MissingAcord103 => "missing 103",
            GateReason::AlreadyTransmitted => "already transmitted",
            GateReason::RestageOutcome => "re-stage outcome",
            GateReason::Ready => "ready",
        }
    }
}

/// `requires_103` and `already_transmitted`/`results_dependent`/`orp_coded`
/// are carrier policy the generic resolver doesn't know; callers pass them
/// in rather than the function reaching into config itself.
pub struct AnalyzeOptions {
    pub requires_acord103: bool,
    pub results_dependent_carrier: bool,
    pub orp_coded: bool,
    pub already_transmitted: bool,
    pub is_restage: bool,
}

pub fn analyze_case(case: &ViableCase, opts: &AnalyzeOptions) -> GateReason {
    if case.sample.is_none() && case.order.is_none() && case.case_qc.is_none() {
        return GateReason::NotFound;
    }
    if case.order.as_ref().is_some_and(|o| o.is_cancelled()) {
        return GateReason::Cancelled;
    }
    let Some(case_qc) = &case.case_qc else {
        return GateReason::NoCaseQc;
    };
    if case.sample.is_none() {
        return GateReason::NoSample;
    }
    if case_qc.state != CaseQcState::Released {
        return GateReason::NotReleased;
    }
    if opts.results_dependent_carrier {
        return GateReason::AwaitingResults;
    }
    if opts.orp_coded {
        return GateReason::OrpCoded;
    }
    if case.contact_id.is_none() {
        return GateReason::NoAsapContact;
    }
    if opts.requires_acord103 && case.acord103.is_none() {
        return GateReason::MissingAcord103;
    }
    if opts.already_transmitted {
        return GateReason::AlreadyTransmitted;
    }
    if opts.is_restage {
        return GateReason::RestageOutcome;
    }
    GateReason::Ready
}
