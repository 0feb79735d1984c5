use async_trait::async_trait;
use camino::Utf8Path;

use asap_model::Case;

use crate::outcome::HookOutcome;

/// Per-carrier customization points. The Contact configuration binds a
/// carrier id to a hook-implementation id; dispatch is a registry lookup
/// built at startup — no runtime class metaprogramming.
#[async_trait]
pub trait TransmitHooks: Send + Sync {
    /// Once per run: rescue files left in `xmitDir`/`xmitZipDir` from a
    /// crashed previous run, to `review/` (manual) or `retrans/`
    /// (automatic) depending on carrier policy.
    async fn pre_stage(&self) -> HookOutcome {
        HookOutcome::Ok
    }

    /// Gate only; `false` does not count as an error.
    async fn is_indexed_case_ready(&self, case: &Case) -> bool {
        let _ = case;
        true
    }

    /// Copies document+index pairs from `docDir/<processed>` and
    /// `indexDir` into `xmitDir/<subpath>` under carrier-specific names.
    /// May bundle the 103 file for first-transmit and/or full-transmit
    /// only.
    async fn stage_indexed_case(&self, case: &Case, xmit_dir: &Utf8Path, is_first_transmit: bool, is_full_transmit: bool) -> HookOutcome;

    /// Zips, optionally PGP-encrypts, uploads, then moves originals to
    /// `sent/`.
    async fn transmit_staged_cases(&self, xmit_dir: &Utf8Path) -> HookOutcome;

    /// Any post-transmit cleanup or downstream notification.
    async fn post_transmit(&self, case: &Case) -> HookOutcome {
        let _ = case;
        HookOutcome::Ok
    }
}
