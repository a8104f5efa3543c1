//! Typed read-only views of the HitTracker state.

use crate::domain::abi::{decode_top_scores, decode_uint, decode_uint_array};
use crate::domain::{Address, HitTracker, LedgerError, PlayerScore, TopScore, U256};
use crate::ports::LedgerClient;
use std::sync::Arc;

pub struct Scoreboard {
    ledger: Arc<dyn LedgerClient>,
    contract: HitTracker,
}

impl Scoreboard {
    pub fn new(ledger: Arc<dyn LedgerClient>, contract: Address) -> Self {
        Self {
            ledger,
            contract: HitTracker::new(contract),
        }
    }

    pub async fn total_hits(&self) -> Result<U256, LedgerError> {
        let data = self.ledger.call(&self.contract.total_hits()).await?;
        Ok(decode_uint(&data)?)
    }

    pub async fn top_scores(&self) -> Result<Vec<TopScore>, LedgerError> {
        let data = self.ledger.call(&self.contract.global_top_scores()).await?;
        Ok(decode_top_scores(&data)?)
    }

    /// Total score and number of recorded hits for `player`.
    pub async fn player_score(&self, player: &Address) -> Result<PlayerScore, LedgerError> {
        let score_call = self.contract.player_total_score(player);
        let hits_call = self.contract.player_hits(player);
        let (score, hits) = tokio::try_join!(
            self.ledger.call(&score_call),
            self.ledger.call(&hits_call),
        )?;

        Ok(PlayerScore {
            player: *player,
            total_score: decode_uint(&score)?,
            hit_count: decode_uint_array(&hits)?.len(),
        })
    }
}
