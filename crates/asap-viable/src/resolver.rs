//! Five search tracks (sid / trackingId / policyNumber / refId /
//! documentId), each idempotent and memoized by the identifier it
//! consumes. A track that discovers a new identifier schedules the
//! matching track; the visited sets guarantee termination since every
//! identifier is visited at most once per call.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use asap_model::{IdentifierTrack, ViableCase, ViableCaseErrors};

use crate::repos::{Acord103Repo, AsapContactRepo, CaseQcRepo, DocGroupRepo, OrderRepo, SampleRepo};

/// A sid whose literal value is this (case-insensitive) terminates the
/// sid track immediately, with no DB roundtrips.
pub const SENTINEL_SID: &str = "XXXXXXXX";

#[derive(Default)]
struct Visited {
    sid: HashSet<String>,
    tracking_id: HashSet<String>,
    policy_number: HashSet<String>,
    ref_id: HashSet<String>,
    document_id: HashSet<String>,
}

pub struct ViableCaseResolver {
    samples: Arc<dyn SampleRepo>,
    orders: Arc<dyn OrderRepo>,
    case_qcs: Arc<dyn CaseQcRepo>,
    acord103: Arc<dyn Acord103Repo>,
    doc_groups: Arc<dyn DocGroupRepo>,
    contacts: Arc<dyn AsapContactRepo>,
}

type BoxFut<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

impl ViableCaseResolver {
    pub fn new(
        samples: Arc<dyn SampleRepo>,
        orders: Arc<dyn OrderRepo>,
        case_qcs: Arc<dyn CaseQcRepo>,
        acord103: Arc<dyn Acord103Repo>,
        doc_groups: Arc<dyn DocGroupRepo>,
        contacts: Arc<dyn AsapContactRepo>,
    ) -> Self {
        Self { samples, orders, case_qcs, acord103, doc_groups, contacts }
    }

    pub async fn from_sid(&self, sid: &str) -> ViableCase {
        let mut case = ViableCase::default();
        let mut visited = Visited::default();
        self.resolve_sid(sid, &mut case, &mut visited).await;
        case
    }

    pub async fn from_tracking_id(&self, tracking_id: &str) -> ViableCase {
        let mut case = ViableCase::default();
        let mut visited = Visited::default();
        self.resolve_tracking_id(tracking_id, &mut case, &mut visited).await;
        case
    }

    pub async fn from_policy_number(&self, policy_number: &str) -> ViableCase {
        let mut case = ViableCase::default();
        let mut visited = Visited::default();
        self.resolve_policy_number(policy_number, &mut case, &mut visited).await;
        case
    }

    pub async fn from_ref_id(&self, ref_id: &str) -> ViableCase {
        let mut case = ViableCase::default();
        let mut visited = Visited::default();
        self.resolve_ref_id(ref_id, &mut case, &mut visited).await;
        case
    }

    pub async fn from_document_id(&self, document_id: &str) -> ViableCase {
        let mut case = ViableCase::default();
        let mut visited = Visited::default();
        self.resolve_document_id(document_id, &mut case, &mut visited).await;
        case
    }

    fn resolve_sid<'a>(&'a self, sid: &'a str, case: &'a mut ViableCase, visited: &'a mut Visited) -> BoxFut<'a> {
        Box::pin(async move {
            if !visited.sid.insert(sid.to_string()) {
                return;
            }
            if sid.eq_ignore_ascii_case(SENTINEL_SID) {
                return;
            }

            let sample = self.samples.by_sid(sid).await;
            if sample.is_none() {
                case.errors |= ViableCaseErrors::NO_SAMPLE_EXISTS;
            }
            case.sample = sample;
            case.doc_group_ids = self.doc_groups.document_group_ids_for_sid(sid).await;

            let contact_id = self.contacts.contact_id_for_sid(sid).await;
            if contact_id.is_none() {
                case.errors |= ViableCaseErrors::NON_ASAP_SAMPLE;
            }
            case.contact_id = contact_id;

            let orders = self.orders.by_sid(sid).await;
            if let Some((primary, rest)) = orders.split_first() {
                if !rest.is_empty() {
                    case.errors |= ViableCaseErrors::MULTIPLE_ORDERS_ONE_SAMPLE;
                    for sibling_order in rest {
                        let mut sibling = ViableCase { order: Some(sibling_order.clone()), ..ViableCase::default() };
                        sibling.errors |= ViableCaseErrors::MULTIPLE_ORDERS_ONE_SAMPLE;
                        case.add_sibling(IdentifierTrack::TrackingId, sibling);
                    }
                }
                if primary.sid != sid {
                    case.errors |= ViableCaseErrors::CASE_EXISTS_FOR_ORDER;
                }
                case.order = Some(primary.clone());
                let tracking_id = primary.tracking_id.clone();
                self.resolve_tracking_id(&tracking_id, case, visited).await;
            }
        })
    }

    fn resolve_tracking_id<'a>(&'a self, tracking_id: &'a str, case: &'a mut ViableCase, visited: &'a mut Visited) -> BoxFut<'a> {
        Box::pin(async move {
            if !visited.tracking_id.insert(tracking_id.to_string()) {
                return;
            }

            if case.order.is_none() {
                case.order = self.orders.by_tracking_id(tracking_id).await;
            }

            let case_qcs = self.case_qcs.by_tracking_id(tracking_id).await;
            if let Some((primary, rest)) = case_qcs.split_first() {
                case.case_qc = Some(primary.clone());
                for sibling_qc in rest {
                    let sibling = ViableCase { case_qc: Some(sibling_qc.clone()), ..ViableCase::default() };
                    case.add_sibling(IdentifierTrack::TrackingId, sibling);
                }
            }

            if case.acord103.is_none() {
                case.acord103 = self.acord103.by_tracking_id(tracking_id).await;
            }

            if let Some(order) = case.order.clone() {
                self.resolve_sid(&order.sid, case, visited).await;
            }
        })
    }

    fn resolve_policy_number<'a>(&'a self, policy_number: &'a str, case: &'a mut ViableCase, visited: &'a mut Visited) -> BoxFut<'a> {
        Box::pin(async move {
            if !visited.policy_number.insert(policy_number.to_string()) {
                return;
            }
            let record = self.acord103.by_policy_number(policy_number).await;
            if let Some(record) = record {
                let tracking_id = record.tracking_id.clone();
                case.acord103 = Some(record);
                self.resolve_tracking_id(&tracking_id, case, visited).await;
            }
        })
    }

    fn resolve_ref_id<'a>(&'a self, ref_id: &'a str, case: &'a mut ViableCase, visited: &'a mut Visited) -> BoxFut<'a> {
        Box::pin(async move {
            if !visited.ref_id.insert(ref_id.to_string()) {
                return;
            }
            let orders = self.orders.by_ref_id(ref_id).await;
            if let Some((primary, rest)) = orders.split_first() {
                if !rest.is_empty() {
                    case.errors |= ViableCaseErrors::MULTIPLE_SELQ_ORDERS;
                    for sibling_order in rest {
                        let sibling = ViableCase { order: Some(sibling_order.clone()), ..ViableCase::default() };
                        case.add_sibling(IdentifierTrack::TrackingId, sibling);
                    }
                }
                case.order = Some(primary.clone());
                let tracking_id = primary.tracking_id.clone();
                self.resolve_tracking_id(&tracking_id, case, visited).await;
            }
        })
    }

    fn resolve_document_id<'a>(&'a self, document_id: &'a str, case: &'a mut ViableCase, visited: &'a mut Visited) -> BoxFut<'a> {
        Box::pin(async move {
            if !visited.document_id.insert(document_id.to_string()) {
                return;
            }
            if let Some(sid) = self.doc_groups.sid_for_document_id(document_id).await {
                self.resolve_sid(&sid, case, visited).await;
            }
        })
    }
}
