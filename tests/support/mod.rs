//! In-memory collaborators for pipeline tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, B256, Bytes, TxHash, U256, address};
use alloy_sol_types::SolCall;
use async_trait::async_trait;

use onchain_agent::agent::{
    Agent, AgentDeps, ChainDispatcher, Intent, IntentInput, IntentValidator,
};
use onchain_agent::chain::abi::{IERC20, IQuoterV2, IUniswapV3Factory};
use onchain_agent::chain::{
    Account, AccountKind, ChainClient, ChainConnector, FundingAccount, TxReceipt, TxRequest,
};
use onchain_agent::config::DEFAULT_ENTRY_POINT;
use onchain_agent::error::{ChainError, ExtractionError};
use onchain_agent::identity::IdentityResolver;
use onchain_agent::llm::{IntentExtractor, KnowledgeBase};
use onchain_agent::registry::{CapabilityRegistry, ChainProfile};

pub const OWNER: Address = address!("2c7536E3605D9C16a7a3D7b1898e529396a65c23");
pub const BOB: Address = address!("20c6F9006d563240031A1388f4f25726029a6368");

pub const BASE: u64 = 8453;
pub const BASE_SEPOLIA: u64 = 84532;
pub const SEPOLIA: u64 = 11155111;

/// `value` ether (or any 18-decimal token) in base units.
pub fn ether(value: &str) -> U256 {
    onchain_agent::chain::units::to_base_units(value, 18, "ETH").unwrap()
}

pub fn usdc(value: &str) -> U256 {
    onchain_agent::chain::units::to_base_units(value, 6, "USDC").unwrap()
}

pub fn registry() -> Arc<CapabilityRegistry> {
    Arc::new(CapabilityRegistry::builtin().unwrap())
}

pub fn profile(chain_id: u64) -> ChainProfile {
    registry().by_chain_id(chain_id).unwrap().clone()
}

pub fn token_address(chain_id: u64, symbol: &str) -> Address {
    profile(chain_id).token(symbol).unwrap().contract().unwrap()
}

pub fn funding() -> FundingAccount {
    FundingAccount {
        kind: AccountKind::Simple,
        owner: OWNER,
        smart_account: None,
        entry_point: DEFAULT_ENTRY_POINT,
        entry_point_version: "0.6".to_string(),
    }
}

pub fn input(
    action: &str,
    token1: Option<&str>,
    token2: Option<&str>,
    chain: &str,
    address: Option<&str>,
    amount: &str,
) -> IntentInput {
    IntentInput {
        action: Some(action.to_string()),
        token1: token1.map(str::to_string),
        token2: token2.map(str::to_string),
        chain: Some(chain.to_string()),
        address: address.map(str::to_string),
        amount: Some(amount.to_string()),
    }
}

pub fn intent(input: IntentInput) -> Intent {
    Intent::from_input(input, None).unwrap()
}

// ── Chain ───────────────────────────────────────────────────

/// Scripted chain: balances, one pool, one quote, recorded submissions.
pub struct MockChain {
    chain_id: u64,
    native: Mutex<U256>,
    tokens: Mutex<HashMap<Address, U256>>,
    pool: Mutex<Address>,
    quote: Mutex<U256>,
    revert_to: Mutex<Option<Address>>,
    reverted: Mutex<HashSet<TxHash>>,
    next_hash: AtomicU64,
    pub sent: Mutex<Vec<TxRequest>>,
    pub balance_queries: AtomicUsize,
    pub reads: Mutex<Vec<[u8; 4]>>,
}

impl MockChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            native: Mutex::new(U256::ZERO),
            tokens: Mutex::new(HashMap::new()),
            pool: Mutex::new(Address::ZERO),
            quote: Mutex::new(U256::ZERO),
            revert_to: Mutex::new(None),
            reverted: Mutex::new(HashSet::new()),
            next_hash: AtomicU64::new(1),
            sent: Mutex::new(Vec::new()),
            balance_queries: AtomicUsize::new(0),
            reads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_native(self, balance: U256) -> Self {
        *self.native.lock().unwrap() = balance;
        self
    }

    pub fn with_token(self, token: Address, balance: U256) -> Self {
        self.tokens.lock().unwrap().insert(token, balance);
        self
    }

    pub fn with_pool(self, pool: Address, quote: U256) -> Self {
        *self.pool.lock().unwrap() = pool;
        *self.quote.lock().unwrap() = quote;
        self
    }

    /// Transactions sent to `to` are mined with a failed status.
    pub fn reverting_calls_to(self, to: Address) -> Self {
        *self.revert_to.lock().unwrap() = Some(to);
        self
    }

    pub fn sent(&self) -> Vec<TxRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn balance_queries(&self) -> usize {
        self.balance_queries.load(Ordering::SeqCst)
    }

    pub fn hash(n: u64) -> TxHash {
        B256::from(U256::from(n).to_be_bytes::<32>())
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(self.chain_id)
    }

    async fn native_balance(&self, _owner: Address) -> Result<U256, ChainError> {
        self.balance_queries.fetch_add(1, Ordering::SeqCst);
        Ok(*self.native.lock().unwrap())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&data[..4]);
        self.reads.lock().unwrap().push(selector);

        if selector == IERC20::balanceOfCall::SELECTOR {
            self.balance_queries.fetch_add(1, Ordering::SeqCst);
            let balance = self
                .tokens
                .lock()
                .unwrap()
                .get(&to)
                .copied()
                .unwrap_or_default();
            return Ok(Bytes::from(balance.to_be_bytes::<32>().to_vec()));
        }
        if selector == IUniswapV3Factory::getPoolCall::SELECTOR {
            let pool = *self.pool.lock().unwrap();
            return Ok(Bytes::from(pool.into_word().to_vec()));
        }
        if selector == IQuoterV2::quoteExactInputSingleCall::SELECTOR {
            // amountOut followed by three zero words.
            let mut out = self.quote.lock().unwrap().to_be_bytes::<32>().to_vec();
            out.resize(128, 0);
            return Ok(Bytes::from(out));
        }
        Err(ChainError::Rpc {
            method: "eth_call",
            code: -32000,
            message: "execution reverted".to_string(),
        })
    }

    async fn send_transaction(&self, _from: &Account, tx: TxRequest) -> Result<TxHash, ChainError> {
        let hash = Self::hash(self.next_hash.fetch_add(1, Ordering::SeqCst));
        if Some(tx.to) == *self.revert_to.lock().unwrap() {
            self.reverted.lock().unwrap().insert(hash);
        }
        self.sent.lock().unwrap().push(tx);
        Ok(hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, ChainError> {
        Ok(TxReceipt {
            tx_hash,
            success: !self.reverted.lock().unwrap().contains(&tx_hash),
            block_number: Some(1),
        })
    }
}

/// Hands out the scripted chains; unknown chains have no endpoint.
#[derive(Default)]
pub struct MockConnector {
    chains: HashMap<u64, Arc<MockChain>>,
    pub connects: AtomicUsize,
}

impl MockConnector {
    pub fn with_chain(mut self, chain: Arc<MockChain>) -> Self {
        self.chains.insert(chain.chain_id, chain);
        self
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl ChainConnector for MockConnector {
    fn connect(&self, profile: &ChainProfile) -> Result<Arc<dyn ChainClient>, ChainError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.chains.get(&profile.chain_id) {
            Some(chain) => Ok(Arc::clone(chain) as Arc<dyn ChainClient>),
            None => Err(ChainError::MissingEndpoint {
                chain: profile.canonical_name.clone(),
                key: profile.rpc_endpoint_key.clone(),
            }),
        }
    }
}

// ── Identity ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockResolver {
    names: HashMap<String, Address>,
    pub calls: AtomicUsize,
}

impl MockResolver {
    pub fn with_name(mut self, name: &str, address: Address) -> Self {
        self.names.insert(name.to_string(), address);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityResolver for MockResolver {
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>, ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.names.get(name).copied())
    }
}

// ── Extraction ──────────────────────────────────────────────

/// Returns a fixed extraction, or no completion when unset.
#[derive(Default)]
pub struct MockExtractor {
    response: Mutex<Option<IntentInput>>,
    pub calls: AtomicUsize,
}

impl MockExtractor {
    pub fn returning(input: IntentInput) -> Self {
        Self {
            response: Mutex::new(Some(input)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentExtractor for MockExtractor {
    async fn extract(&self, _prompt: &str) -> Result<IntentInput, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .lock()
            .unwrap()
            .clone()
            .ok_or(ExtractionError::NoCompletion)
    }
}

#[derive(Default)]
pub struct MockKnowledge {
    pub answer: Option<String>,
}

#[async_trait]
impl KnowledgeBase for MockKnowledge {
    async fn ask(&self, _question: &str) -> Result<Option<String>, ExtractionError> {
        Ok(self.answer.clone())
    }
}

// ── Wiring ──────────────────────────────────────────────────

pub fn validator(connector: Arc<MockConnector>, resolver: Arc<MockResolver>) -> IntentValidator {
    IntentValidator::new(registry(), resolver, connector, funding())
}

/// Agent over one scripted chain.
pub struct Harness {
    pub agent: Agent,
    pub chain: Arc<MockChain>,
    pub connector: Arc<MockConnector>,
    pub resolver: Arc<MockResolver>,
    pub extractor: Arc<MockExtractor>,
}

impl Harness {
    pub fn new(chain: MockChain, resolver: MockResolver, extractor: MockExtractor) -> Self {
        Self::with_knowledge(chain, resolver, extractor, MockKnowledge::default())
    }

    pub fn with_knowledge(
        chain: MockChain,
        resolver: MockResolver,
        extractor: MockExtractor,
        knowledge: MockKnowledge,
    ) -> Self {
        let chain = Arc::new(chain);
        let connector = Arc::new(MockConnector::default().with_chain(Arc::clone(&chain)));
        let resolver = Arc::new(resolver);
        let extractor = Arc::new(extractor);

        let agent = Agent::new(AgentDeps {
            registry: registry(),
            extractor: extractor.clone(),
            knowledge: Arc::new(knowledge),
            validator: validator(Arc::clone(&connector), Arc::clone(&resolver)),
            dispatcher: ChainDispatcher::new(connector.clone()),
            funding: funding(),
        });

        Self {
            agent,
            chain,
            connector,
            resolver,
            extractor,
        }
    }

    /// Send one message and collect the reply texts.
    pub async fn send(&self, content: &str) -> Vec<String> {
        let message = onchain_agent::channels::IncomingMessage::new("test", "user", content);
        self.agent
            .handle_message(&message)
            .await
            .into_iter()
            .map(|reply| reply.content)
            .collect()
    }
}
