//! Checkpoint resolution.
//!
//! The resume cursor is not stored anywhere; it is derived from the
//! corpus on every run so a partially failed run needs no repair step.

use chrono::{DateTime, Utc};

use crate::models::Corpus;
use crate::storage::StoreGateway;

/// Load the corpus through the gateway, degrading to an empty corpus on
/// any load problem. A missing or unreadable corpus is a warning, not a
/// failure: the run proceeds with a full scan.
pub async fn load_corpus(store: &dyn StoreGateway) -> Corpus {
    match store.read_corpus().await {
        Ok(Some(bytes)) => match Corpus::decode(&bytes) {
            Ok(corpus) => {
                if !corpus.malformed.is_empty() {
                    log::warn!(
                        "Corpus has {} undecodable rows; they are kept but ignored for checkpointing",
                        corpus.malformed.len()
                    );
                }
                corpus
            }
            Err(e) => {
                log::warn!("Corpus is unreadable ({e}); starting a full scan");
                Corpus::empty()
            }
        },
        Ok(None) => {
            log::info!("No corpus found; starting a full scan");
            Corpus::empty()
        }
        Err(e) => {
            log::warn!("Corpus load failed ({e}); starting a full scan");
            Corpus::empty()
        }
    }
}

/// Resume cursor: max timestamp over decoded rows, `None` for a full scan.
pub fn resolve(corpus: &Corpus) -> Option<DateTime<Utc>> {
    corpus.records.iter().map(|r| r.timestamp).max()
}
