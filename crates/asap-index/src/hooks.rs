use asap_model::{Case, Contact, Document, Index};

use crate::IndexError;

/// Per-carrier customization points, bound to a `Contact` at startup
/// through a registry lookup — no runtime class metaprogramming.
pub trait IndexHooks: Send + Sync {
    /// Gate only; `false` means "not yet, try next run", not an error.
    fn is_ready_to_index(&self, case: &Case) -> bool {
        let _ = case;
        true
    }

    /// Runs once per case before any field is resolved. May inspect or
    /// adjust the schema before resolution begins.
    fn pre_process_index(&self, case: &Case, index: &mut Index) -> Result<(), IndexError> {
        let _ = (case, index);
        Ok(())
    }

    /// Runs once per case (type CASE) or once per document (type
    /// DOCUMENT). May set/override field values, consult the parsed 121 or
    /// 103 handler, or modify the image via the TIFF port.
    fn process_derived_fields(&self, case: &Case, document: Option<&Document>, index: &mut Index) -> Result<(), IndexError> {
        let _ = (case, document, index);
        Ok(())
    }

    /// Runs once per case after every IDX has been written. May replace
    /// the intermediate IDX with a carrier-native format.
    fn post_process_index(&self, case: &Case, contact: &Contact) -> Result<(), IndexError> {
        let _ = (case, contact);
        Ok(())
    }
}

/// The hooks contract with every method at its documented default,
/// suitable when a carrier needs none of the customization points.
pub struct DefaultIndexHooks;

impl IndexHooks for DefaultIndexHooks {}
