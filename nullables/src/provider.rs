//! Nullable provider: an in-memory election contract behind the provider trait.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use election_chain::{
    methods, ChainError, ElectionAbi, Token, TransactionReceipt, TransactionRequest, TxHash,
    WalletProvider,
};
use election_types::{Address, CandidateName};
use ethabi::Uint;

use crate::contract::NullElection;

type ReadHook = Box<dyn FnMut(&str, &mut NullElection) + Send>;

struct PendingReceipt {
    receipt: TransactionReceipt,
    /// Polls that still report "pending" before the receipt shows up.
    remaining_polls: u32,
}

/// A deterministic wallet provider for testing.
///
/// View calls are answered from a [`NullElection`]. Transactions apply to it
/// immediately; their receipts become visible after a configurable number of
/// polls. A transaction the contract would revert yields a receipt with
/// `status == false`.
pub struct NullProvider {
    contract: Address,
    abi: ElectionAbi,
    election: Mutex<NullElection>,
    coinbase: Mutex<Option<Address>>,
    read_failures: Mutex<HashMap<String, ChainError>>,
    send_failure: Mutex<Option<ChainError>>,
    coinbase_failure: Mutex<Option<ChainError>>,
    read_hook: Mutex<Option<ReadHook>>,
    confirmation_polls: Mutex<u32>,
    receipts: Mutex<HashMap<TxHash, PendingReceipt>>,
    reads: Mutex<Vec<String>>,
    sent: Mutex<Vec<String>>,
    reverts: Mutex<Vec<String>>,
    coinbase_calls: AtomicUsize,
    receipt_polls: AtomicUsize,
    next_tx: AtomicU64,
}

impl NullProvider {
    /// Address the simulated contract lives at.
    pub const CONTRACT: Address = Address::new([0xc0; 20]);

    /// A provider whose contract is owned by `owner`, with no active account.
    pub fn new(owner: Address) -> Self {
        Self {
            contract: Self::CONTRACT,
            abi: ElectionAbi::embedded().expect("embedded ABI parses"),
            election: Mutex::new(NullElection::new(owner)),
            coinbase: Mutex::new(None),
            read_failures: Mutex::new(HashMap::new()),
            send_failure: Mutex::new(None),
            coinbase_failure: Mutex::new(None),
            read_hook: Mutex::new(None),
            confirmation_polls: Mutex::new(0),
            receipts: Mutex::new(HashMap::new()),
            reads: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            reverts: Mutex::new(Vec::new()),
            coinbase_calls: AtomicUsize::new(0),
            receipt_polls: AtomicUsize::new(0),
            next_tx: AtomicU64::new(1),
        }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    // ── Contract state ────────────────────────────────────────────────

    /// Set (or clear) the account the wallet reports as active.
    pub fn set_coinbase(&self, account: Option<Address>) {
        *self.coinbase.lock().unwrap() = account;
    }

    /// Append a candidate with an initial vote count.
    pub fn seed_candidate(&self, name: &str, votes: u64) {
        let raw = CandidateName::encode(name).expect("valid candidate name");
        self.election.lock().unwrap().candidates.push((raw, votes));
    }

    /// Append a candidate stored under an arbitrary raw bytes32 value.
    pub fn seed_raw_candidate(&self, raw: [u8; 32], votes: u64) {
        self.election
            .lock()
            .unwrap()
            .candidates
            .push((CandidateName::from_raw(raw), votes));
    }

    pub fn seed_registered(&self, voter: Address) {
        self.election.lock().unwrap().registered.insert(voter);
    }

    pub fn seed_approved(&self, voter: Address) {
        let mut election = self.election.lock().unwrap();
        election.registered.insert(voter);
        election.approved.insert(voter);
    }

    pub fn seed_voted(&self, voter: Address) {
        self.election.lock().unwrap().voted.insert(voter);
    }

    /// Copy of the current contract state.
    pub fn election(&self) -> NullElection {
        self.election.lock().unwrap().clone()
    }

    // ── Failure injection ─────────────────────────────────────────────

    /// Make every read of `method` fail with `error` until cleared.
    pub fn fail_reads_of(&self, method: &str, error: ChainError) {
        self.read_failures
            .lock()
            .unwrap()
            .insert(method.to_string(), error);
    }

    /// Make every `send_transaction` fail with `error` until cleared.
    pub fn fail_sends(&self, error: ChainError) {
        *self.send_failure.lock().unwrap() = Some(error);
    }

    /// Make `coinbase` fail with `error` until cleared.
    pub fn fail_coinbase(&self, error: ChainError) {
        *self.coinbase_failure.lock().unwrap() = Some(error);
    }

    pub fn clear_failures(&self) {
        self.read_failures.lock().unwrap().clear();
        *self.send_failure.lock().unwrap() = None;
        *self.coinbase_failure.lock().unwrap() = None;
    }

    /// Run `hook` after every successful read, with write access to the contract.
    pub fn on_read(&self, hook: impl FnMut(&str, &mut NullElection) + Send + 'static) {
        *self.read_hook.lock().unwrap() = Some(Box::new(hook));
    }

    /// Number of receipt polls that report "pending" before a receipt appears.
    pub fn set_confirmation_polls(&self, polls: u32) {
        *self.confirmation_polls.lock().unwrap() = polls;
    }

    // ── Assertions ────────────────────────────────────────────────────

    /// Method names of every view call, in order.
    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }

    /// Method names of every transaction sent, in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Revert reasons of transactions that failed on-chain.
    pub fn reverts(&self) -> Vec<String> {
        self.reverts.lock().unwrap().clone()
    }

    pub fn receipt_polls(&self) -> usize {
        self.receipt_polls.load(Ordering::SeqCst)
    }

    /// Every request that reached this provider, of any kind.
    pub fn network_calls(&self) -> usize {
        self.reads.lock().unwrap().len()
            + self.sent.lock().unwrap().len()
            + self.coinbase_calls.load(Ordering::SeqCst)
            + self.receipt_polls.load(Ordering::SeqCst)
    }

    /// Forget recorded traffic; contract state is kept.
    pub fn reset_traffic(&self) {
        self.reads.lock().unwrap().clear();
        self.sent.lock().unwrap().clear();
        self.reverts.lock().unwrap().clear();
        self.coinbase_calls.store(0, Ordering::SeqCst);
        self.receipt_polls.store(0, Ordering::SeqCst);
    }

    // ── Internals ─────────────────────────────────────────────────────

    fn check_contract(&self, to: Address) -> Result<(), ChainError> {
        if to != self.contract {
            return Err(ChainError::Rpc {
                code: -32000,
                message: format!("no contract deployed at {to}"),
            });
        }
        Ok(())
    }

    fn next_hash(&self) -> TxHash {
        let n = self.next_tx.fetch_add(1, Ordering::SeqCst);
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&n.to_be_bytes());
        TxHash::new(bytes)
    }
}

impl WalletProvider for NullProvider {
    async fn coinbase(&self) -> Result<Address, ChainError> {
        self.coinbase_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.coinbase_failure.lock().unwrap().clone() {
            return Err(err);
        }
        self.coinbase.lock().unwrap().ok_or(ChainError::NoAccount)
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ChainError> {
        self.check_contract(to)?;
        let (function, args) = self.abi.decode_call(&data)?;
        let method = function.name.clone();
        self.reads.lock().unwrap().push(method.clone());

        if let Some(err) = self.read_failures.lock().unwrap().get(&method) {
            return Err(err.clone());
        }

        let output = {
            let mut election = self.election.lock().unwrap();
            let output = view(&*election, &method, &args)?;
            if let Some(hook) = self.read_hook.lock().unwrap().as_mut() {
                hook(&method, &mut *election);
            }
            output
        };
        self.abi.encode_output(&method, &output)
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxHash, ChainError> {
        self.check_contract(request.to)?;
        let (function, args) = self.abi.decode_call(&request.data)?;
        let method = function.name.clone();
        self.sent.lock().unwrap().push(method.clone());

        if let Some(err) = self.send_failure.lock().unwrap().clone() {
            return Err(err);
        }

        let outcome = {
            let mut election = self.election.lock().unwrap();
            execute(&mut *election, request.from, &method, &args)?
        };
        let status = match outcome {
            Ok(()) => true,
            Err(reason) => {
                self.reverts.lock().unwrap().push(format!("{method}: {reason}"));
                false
            }
        };

        let hash = self.next_hash();
        let remaining_polls = *self.confirmation_polls.lock().unwrap();
        let receipt = TransactionReceipt {
            transaction_hash: hash,
            block_number: Some(self.next_tx.load(Ordering::SeqCst)),
            gas_used: Some(21_000),
            status,
        };
        self.receipts.lock().unwrap().insert(
            hash,
            PendingReceipt {
                receipt,
                remaining_polls,
            },
        );
        Ok(hash)
    }

    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, ChainError> {
        self.receipt_polls.fetch_add(1, Ordering::SeqCst);
        let mut receipts = self.receipts.lock().unwrap();
        match receipts.get_mut(&hash) {
            None => Ok(None),
            Some(pending) if pending.remaining_polls > 0 => {
                pending.remaining_polls -= 1;
                Ok(None)
            }
            Some(pending) => Ok(Some(pending.receipt.clone())),
        }
    }
}

fn reverted() -> ChainError {
    ChainError::Rpc {
        code: -32000,
        message: "execution reverted".into(),
    }
}

/// Answer a view call from contract state.
fn view(election: &NullElection, method: &str, args: &[Token]) -> Result<Vec<Token>, ChainError> {
    let out = match method {
        methods::VOTER_IS_REGISTERED => Token::Bool(election.is_registered(&address_arg(args, 0)?)),
        methods::REGISTRATION_IS_APPROVED => {
            Token::Bool(election.is_approved(&address_arg(args, 0)?))
        }
        methods::VOTER_HAS_VOTED => Token::Bool(election.has_voted(&address_arg(args, 0)?)),
        methods::OWNER => Token::Address(ethabi::Address::from(*election.owner.as_bytes())),
        methods::GET_CANDIDATE_COUNT => Token::Uint(Uint::from(election.candidates.len() as u64)),
        methods::GET_CANDIDATE_NAME_FOR_INDEX => {
            let index = index_arg(args, 0)?;
            let name = election.candidate_at(index).ok_or_else(reverted)?;
            Token::FixedBytes(name.as_bytes().to_vec())
        }
        methods::GET_VOTE_COUNT_FOR_CANDIDATE => {
            Token::Uint(Uint::from(election.votes_for(&name_arg(args, 0)?)))
        }
        other => {
            return Err(ChainError::Rpc {
                code: -32000,
                message: format!("{other} is not a view method"),
            })
        }
    };
    Ok(vec![out])
}

/// Apply a transaction. The outer error is a malformed request, the inner one a revert.
fn execute(
    election: &mut NullElection,
    sender: Address,
    method: &str,
    args: &[Token],
) -> Result<Result<(), String>, ChainError> {
    Ok(match method {
        methods::REGISTER_VOTER => election.register_voter(sender),
        methods::APPROVE_REGISTRATION => {
            election.approve_registration(sender, address_arg(args, 0)?)
        }
        methods::APPROVE_REGISTRATIONS => {
            election.approve_registrations(sender, &addresses_arg(args, 0)?)
        }
        methods::ADD_CANDIDATE => election.add_candidate(sender, name_arg(args, 0)?),
        methods::VOTE_FOR_CANDIDATE => election.vote_for_candidate(sender, name_arg(args, 0)?),
        other => Err(format!("{other} cannot be sent as a transaction")),
    })
}

fn arg<'a>(args: &'a [Token], i: usize) -> Result<&'a Token, ChainError> {
    args.get(i)
        .ok_or_else(|| ChainError::Abi(format!("missing argument {i}")))
}

fn token_address(token: &Token) -> Result<Address, ChainError> {
    match token {
        Token::Address(addr) => Ok(Address::new(addr.to_fixed_bytes())),
        other => Err(ChainError::Abi(format!("expected address, got {other:?}"))),
    }
}

fn address_arg(args: &[Token], i: usize) -> Result<Address, ChainError> {
    token_address(arg(args, i)?)
}

fn addresses_arg(args: &[Token], i: usize) -> Result<Vec<Address>, ChainError> {
    match arg(args, i)? {
        Token::Array(items) => items.iter().map(token_address).collect(),
        other => Err(ChainError::Abi(format!("expected address[], got {other:?}"))),
    }
}

fn index_arg(args: &[Token], i: usize) -> Result<usize, ChainError> {
    match arg(args, i)? {
        Token::Uint(value) if value.bits() <= 64 => Ok(value.low_u64() as usize),
        other => Err(ChainError::Abi(format!("expected small uint, got {other:?}"))),
    }
}

fn name_arg(args: &[Token], i: usize) -> Result<CandidateName, ChainError> {
    match arg(args, i)? {
        Token::FixedBytes(bytes) if bytes.len() == CandidateName::LEN => {
            let mut raw = [0u8; 32];
            raw.copy_from_slice(bytes);
            Ok(CandidateName::from_raw(raw))
        }
        other => Err(ChainError::Abi(format!("expected bytes32, got {other:?}"))),
    }
}
