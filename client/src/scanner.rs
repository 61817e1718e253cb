//! Candidate list reconstruction from the contract's indexed array.

use futures_util::{stream, StreamExt, TryStreamExt};
use tracing::debug;

use election_chain::{ChainError, ChainReader, WalletProvider};
use election_types::Candidate;

/// Reads every candidate by index.
///
/// The count is read once when the scan starts and bounds the scan even if
/// candidates are added while it runs. Each index costs two reads: the raw
/// bytes32 name, then the vote count keyed by that same raw value. Up to
/// `concurrency` indices are in flight at once; output is always in index
/// order. The first failed read aborts the scan.
pub struct CandidateScanner<P> {
    reader: ChainReader<P>,
    concurrency: usize,
}

impl<P: WalletProvider> CandidateScanner<P> {
    /// Strictly sequential scanner.
    pub fn new(reader: ChainReader<P>) -> Self {
        Self::with_concurrency(reader, 1)
    }

    pub fn with_concurrency(reader: ChainReader<P>, concurrency: usize) -> Self {
        Self {
            reader,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn scan(&self) -> Result<Vec<Candidate>, ChainError> {
        let count = self.reader.candidate_count().await?;
        debug!(count, concurrency = self.concurrency, "scanning candidates");

        let reader = self.reader.clone();
        stream::iter(0..count)
            .map(move |index| read_candidate(reader.clone(), index))
            .buffered(self.concurrency)
            .try_collect()
            .await
    }
}

async fn read_candidate<P: WalletProvider>(
    reader: ChainReader<P>,
    index: u64,
) -> Result<Candidate, ChainError> {
    let raw = reader.candidate_name_at(index).await?;
    let name = raw.decode()?;
    let votes = reader.vote_count_for(&raw).await?;
    Ok(Candidate { name, votes })
}
