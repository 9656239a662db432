//! End-to-end intent handling against scripted chains.

mod support;

use std::sync::Arc;

use alloy_primitives::{Address, address};
use alloy_sol_types::SolCall;
use pretty_assertions::assert_eq;

use onchain_agent::agent::{Action, IntentValidator};
use onchain_agent::chain::abi::{IERC20, ISwapRouter02, IWETH9};
use onchain_agent::error::{ErrorKind, IntentError};
use onchain_agent::registry::CapabilityRegistry;

use support::*;

fn selector(data: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&data[..4]);
    out
}

// ── Validation ──────────────────────────────────────────────

#[test]
fn chain_aliases_resolve_to_one_profile() {
    let registry = CapabilityRegistry::builtin().unwrap();
    for name in ["Base Sepolia", "BASE   sepolia", "basesepolia", "base testnet"] {
        assert_eq!(
            registry.resolve_chain(name).unwrap().chain_id,
            BASE_SEPOLIA,
            "alias {name:?}"
        );
    }
}

#[tokio::test]
async fn unsupported_chain_is_rejected_before_any_lookup() {
    let connector = Arc::new(MockConnector::default());
    let resolver = Arc::new(MockResolver::default().with_name("bob.eth", BOB));
    let validator = validator(Arc::clone(&connector), Arc::clone(&resolver));

    let err = validator
        .validate(&intent(input(
            "transfer",
            Some("ETH"),
            None,
            "Polygon",
            Some("bob"),
            "1",
        )))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedChain);
    let message = err.to_string();
    assert!(message.contains("'Polygon'"), "{message}");
    for chain in ["Base", "Base Sepolia", "Sepolia", "Unichain Sepolia"] {
        assert!(message.contains(chain), "{message}");
    }
    assert_eq!(resolver.calls(), 0);
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn unsupported_action_names_alternative_chains() {
    let connector = Arc::new(MockConnector::default());
    let resolver = Arc::new(MockResolver::default());
    let validator = validator(Arc::clone(&connector), Arc::clone(&resolver));

    let err = validator
        .validate(&intent(input(
            "swap",
            Some("USDC"),
            Some("WETH"),
            "base",
            None,
            "10",
        )))
        .await
        .unwrap_err();

    match &err {
        IntentError::UnsupportedActionForChain {
            chain,
            chains_for_action,
            ..
        } => {
            assert_eq!(chain, "Base");
            assert!(chains_for_action.contains(&"Sepolia".to_string()));
        }
        other => panic!("expected UnsupportedActionForChain, got {other:?}"),
    }
    assert_eq!(connector.connects(), 0);
    assert_eq!(resolver.calls(), 0);
}

#[tokio::test]
async fn every_unsupported_chain_action_pair_fails_before_lookups() {
    let registry = registry();
    let mut rejected = Vec::new();

    for profile in registry.profiles() {
        for action in Action::EXECUTABLE {
            if profile.supports_action(action) {
                continue;
            }
            let connector = Arc::new(MockConnector::default());
            let resolver = Arc::new(MockResolver::default().with_name("bob.eth", BOB));
            let validator = validator(Arc::clone(&connector), Arc::clone(&resolver));

            let err = validator
                .validate(&intent(input(
                    action.as_str(),
                    Some("USDC"),
                    Some("WETH"),
                    &profile.canonical_name,
                    Some("bob"),
                    "1",
                )))
                .await
                .unwrap_err();

            let pair = format!("{} {}", profile.canonical_name, action.as_str());
            assert_eq!(err.kind(), ErrorKind::UnsupportedActionForChain, "{pair}");
            assert_eq!(resolver.calls(), 0, "{pair}");
            assert_eq!(connector.connects(), 0, "{pair}");
            rejected.push(pair);
        }
    }

    assert_eq!(
        rejected,
        vec![
            "Base swap",
            "Base wrap",
            "Base Sepolia wrap",
            "Sepolia transfer",
            "Unichain Sepolia transfer",
            "Unichain Sepolia wrap",
        ]
    );
}

#[tokio::test]
async fn native_swap_leg_trades_wrapped_token() {
    let weth = token_address(BASE_SEPOLIA, "WETH");
    let chain = Arc::new(MockChain::new(BASE_SEPOLIA).with_token(weth, ether("1")));
    let connector = Arc::new(MockConnector::default().with_chain(Arc::clone(&chain)));
    let validator = validator(connector, Arc::new(MockResolver::default()));

    let validated = validator
        .validate(&intent(input(
            "swap",
            Some("ETH"),
            Some("USDC"),
            "Base Sepolia",
            None,
            "0.01",
        )))
        .await
        .unwrap();

    assert_eq!(validated.source_token().symbol, "WETH");
    assert_eq!(validated.source_token().contract(), Some(weth));
    assert_eq!(validated.target_token().unwrap().symbol, "USDC");
    assert_eq!(validated.amount_units(), ether("0.01"));
    assert_eq!(validated.balance().symbol, "WETH");
    assert_eq!(validated.recipient(), OWNER);
}

#[tokio::test]
async fn native_swap_into_wrapped_token_is_a_self_swap() {
    let validator = validator(
        Arc::new(MockConnector::default()),
        Arc::new(MockResolver::default()),
    );

    let err = validator
        .validate(&intent(input(
            "swap",
            Some("ETH"),
            Some("WETH"),
            "sepolia",
            None,
            "1",
        )))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedToken);
    assert!(err.to_string().contains("cannot be swapped for itself"));
}

#[tokio::test]
async fn native_swap_without_wrapped_token_is_rejected() {
    let registry = Arc::new(
        CapabilityRegistry::from_toml_str(
            r#"
[[chains]]
chain_id = 10
canonical_name = "Optimism"
explorer_base_url = "https://optimistic.etherscan.io"
rpc_endpoint_key = "OPTIMISM_RPC_URL"
native_symbol = "ETH"
supported_actions = ["swap"]

[chains.tokens.ETH]
native = true
decimals = 18

[chains.tokens.USDC]
address = "0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85"
decimals = 6

[chains.tokens.DAI]
address = "0xDA10009cBd5D07dd0CeCc66161FC93D7c9000da1"
decimals = 18

[chains.swap_venue]
factory = "0x1F98431c8aD98523631AE4a59f267346ea31F984"
quoter = "0x61fFE014bA17989E743c5F6cB21bF9697530B21e"
router = "0x68b3465833fb72A70ecDF485E0e4C7bD8665Fc45"
pool_fee = 500
"#,
        )
        .unwrap(),
    );
    let connector = Arc::new(MockConnector::default());
    let validator = IntentValidator::new(
        registry,
        Arc::new(MockResolver::default()),
        connector.clone(),
        funding(),
    );

    let err = validator
        .validate(&intent(input(
            "swap",
            Some("ETH"),
            Some("USDC"),
            "optimism",
            None,
            "1",
        )))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedToken);
    assert_eq!(
        err.to_string(),
        "The token 'ETH' is not supported on Optimism: swaps use ERC-20 tokens. Supported tokens: DAI, USDC."
    );
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn unknown_token_lists_supported_symbols() {
    let connector = Arc::new(MockConnector::default());
    let validator = validator(Arc::clone(&connector), Arc::new(MockResolver::default()));

    let err = validator
        .validate(&intent(input(
            "transfer",
            Some("DOGE"),
            None,
            "base sepolia",
            Some(&BOB.to_string()),
            "1",
        )))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedToken);
    assert!(err.to_string().contains("USDC"));
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn balance_equal_to_amount_is_insufficient() {
    let chain = Arc::new(MockChain::new(BASE_SEPOLIA).with_native(ether("1")));
    let connector = Arc::new(MockConnector::default().with_chain(Arc::clone(&chain)));
    let validator = validator(connector, Arc::new(MockResolver::default()));

    let err = validator
        .validate(&intent(input(
            "transfer",
            Some("ETH"),
            None,
            "base sepolia",
            Some(&BOB.to_string()),
            "1",
        )))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    assert!(err.to_string().contains("Base Sepolia"));
    assert_eq!(chain.balance_queries(), 1);
}

#[tokio::test]
async fn balance_one_unit_above_amount_passes() {
    let balance = ether("1") + alloy_primitives::U256::from(1u8);
    let chain = Arc::new(MockChain::new(BASE_SEPOLIA).with_native(balance));
    let connector = Arc::new(MockConnector::default().with_chain(chain));
    let validator = validator(connector, Arc::new(MockResolver::default()));

    let validated = validator
        .validate(&intent(input(
            "transfer",
            Some("eth"),
            None,
            "base sepolia",
            Some(&BOB.to_string()),
            "1",
        )))
        .await
        .unwrap();

    assert_eq!(validated.recipient(), BOB);
    assert_eq!(validated.amount_units(), ether("1"));
    assert_eq!(validated.balance().have_units, balance);
    assert_eq!(validated.account().address, OWNER);
}

#[tokio::test]
async fn unresolved_recipient_skips_balance_read() {
    let chain = Arc::new(MockChain::new(BASE_SEPOLIA).with_native(ether("5")));
    let connector = Arc::new(MockConnector::default().with_chain(Arc::clone(&chain)));
    let resolver = Arc::new(MockResolver::default());
    let validator = validator(Arc::clone(&connector), Arc::clone(&resolver));

    let err = validator
        .validate(&intent(input(
            "transfer",
            Some("ETH"),
            None,
            "base sepolia",
            Some("nobody"),
            "1",
        )))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnresolvedRecipient);
    assert!(err.to_string().contains("'nobody'"));
    assert_eq!(resolver.calls(), 1);
    assert_eq!(chain.balance_queries(), 0);
    assert_eq!(connector.connects(), 0);
}

// ── Execution through the agent ─────────────────────────────

#[tokio::test]
async fn native_transfer_reports_explorer_link() {
    let harness = Harness::new(
        MockChain::new(BASE_SEPOLIA).with_native(ether("2")),
        MockResolver::default().with_name("bob.eth", BOB),
        MockExtractor::returning(input(
            "transfer",
            Some("ETH"),
            None,
            "base sepolia",
            Some("bob"),
            "0.5",
        )),
    );

    let replies = harness
        .send("/transfer 0.5 ETH to bob on base sepolia")
        .await;

    assert_eq!(replies.len(), 1);
    assert!(
        replies[0].contains("executed. View on Block Explorer: https://sepolia.basescan.org/tx/0x"),
        "{}",
        replies[0]
    );
    let sent = harness.chain.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, BOB);
    assert_eq!(sent[0].value, ether("0.5"));
    assert!(sent[0].data.is_empty());
    assert_eq!(harness.extractor.calls(), 1);
}

#[tokio::test]
async fn token_transfer_calls_erc20_transfer() {
    let usdc_address = token_address(BASE_SEPOLIA, "USDC");
    let harness = Harness::new(
        MockChain::new(BASE_SEPOLIA).with_token(usdc_address, usdc("100")),
        MockResolver::default(),
        MockExtractor::returning(input(
            "transfer",
            Some("USDC"),
            None,
            "base sepolia",
            Some(&BOB.to_string()),
            "25",
        )),
    );

    let replies = harness.send("/transfer 25 USDC to bob").await;

    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("executed"), "{}", replies[0]);
    let sent = harness.chain.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, usdc_address);
    assert!(sent[0].value.is_zero());
    assert_eq!(selector(&sent[0].data), IERC20::transferCall::SELECTOR);
    let call = IERC20::transferCall::abi_decode(&sent[0].data).unwrap();
    assert_eq!(call.to, BOB);
    assert_eq!(call.amount, usdc("25"));
}

#[tokio::test]
async fn wrap_deposits_native_into_wrapped_token() {
    let weth = token_address(SEPOLIA, "WETH");
    let harness = Harness::new(
        MockChain::new(SEPOLIA).with_native(ether("1")),
        MockResolver::default(),
        MockExtractor::returning(input("wrap", None, None, "sepolia", None, "0.25")),
    );

    let replies = harness.send("/wrap 0.25 ETH on sepolia").await;

    assert_eq!(replies.len(), 1);
    assert!(
        replies[0].contains("https://sepolia.etherscan.io/tx/0x"),
        "{}",
        replies[0]
    );
    let sent = harness.chain.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, weth);
    assert_eq!(sent[0].value, ether("0.25"));
    assert_eq!(selector(&sent[0].data), IWETH9::depositCall::SELECTOR);
}

#[tokio::test]
async fn zero_quote_aborts_before_approval() {
    let weth = token_address(SEPOLIA, "WETH");
    let harness = Harness::new(
        MockChain::new(SEPOLIA)
            .with_token(weth, ether("3"))
            .with_pool(Address::repeat_byte(0x77), alloy_primitives::U256::ZERO),
        MockResolver::default(),
        MockExtractor::returning(input(
            "swap",
            Some("WETH"),
            Some("USDC"),
            "sepolia",
            None,
            "1",
        )),
    );

    let replies = harness.send("/swap 1 WETH for USDC on sepolia").await;

    assert_eq!(
        replies,
        vec!["The quote for swapping WETH to USDC returned zero; the pool may be empty.".to_string()]
    );
    assert!(harness.chain.sent().is_empty());
}

#[tokio::test]
async fn missing_pool_is_reported() {
    let weth = token_address(SEPOLIA, "WETH");
    let harness = Harness::new(
        MockChain::new(SEPOLIA).with_token(weth, ether("3")),
        MockResolver::default(),
        MockExtractor::returning(input(
            "swap",
            Some("WETH"),
            Some("USDC"),
            "sepolia",
            None,
            "1",
        )),
    );

    let replies = harness.send("/swap 1 WETH for USDC on sepolia").await;

    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("No WETH/USDC pool"), "{}", replies[0]);
    assert!(harness.chain.sent().is_empty());
}

#[tokio::test]
async fn eth_swap_on_base_sepolia_routes_through_weth() {
    let weth = token_address(BASE_SEPOLIA, "WETH");
    let usdc_address = token_address(BASE_SEPOLIA, "USDC");
    let router = profile(BASE_SEPOLIA).swap_venue.unwrap().router;
    let harness = Harness::new(
        MockChain::new(BASE_SEPOLIA)
            .with_token(weth, ether("0.5"))
            .with_pool(Address::repeat_byte(0x42), usdc("25")),
        MockResolver::default(),
        MockExtractor::returning(input(
            "swap",
            Some("ETH"),
            Some("USDC"),
            "Base Sepolia",
            None,
            "0.01",
        )),
    );

    let replies = harness.send("/swap 0.01 ETH for USDC on Base Sepolia").await;

    let swap_hash = MockChain::hash(2);
    assert_eq!(
        replies,
        vec![format!(
            "{swap_hash} executed. View on Block Explorer: https://sepolia.basescan.org/tx/{swap_hash}"
        )]
    );
    let sent = harness.chain.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, weth);
    assert!(sent[0].value.is_zero());
    assert_eq!(sent[1].to, router);
    let swap = ISwapRouter02::exactInputSingleCall::abi_decode(&sent[1].data).unwrap();
    assert_eq!(swap.params.tokenIn, weth);
    assert_eq!(swap.params.tokenOut, usdc_address);
    assert_eq!(swap.params.amountIn, ether("0.01"));
}

#[tokio::test]
async fn swap_with_recipient_delivers_output() {
    let weth = token_address(SEPOLIA, "WETH");
    let usdc_address = token_address(SEPOLIA, "USDC");
    let router = profile(SEPOLIA).swap_venue.unwrap().router;
    let quote = usdc("2500");
    let harness = Harness::new(
        MockChain::new(SEPOLIA)
            .with_token(weth, ether("3"))
            .with_pool(Address::repeat_byte(0x77), quote),
        MockResolver::default().with_name("bob.eth", BOB),
        MockExtractor::returning(input(
            "swap",
            Some("WETH"),
            Some("USDC"),
            "sepolia",
            Some("bob"),
            "1",
        )),
    );

    let replies = harness
        .send("/swap 1 WETH for USDC on sepolia and send it to bob")
        .await;

    // Hashes follow submission order: approve, swap, delivery.
    let swap_hash = MockChain::hash(2);
    let delivery_hash = MockChain::hash(3);
    assert_eq!(
        replies,
        vec![
            format!(
                "{swap_hash} executed. View on Block Explorer: https://sepolia.etherscan.io/tx/{swap_hash}"
            ),
            format!(
                "{delivery_hash} executed. View on Block Explorer: https://sepolia.etherscan.io/tx/{delivery_hash}"
            ),
        ]
    );

    let sent = harness.chain.sent();
    assert_eq!(sent.len(), 3);

    assert_eq!(sent[0].to, weth);
    let approve = IERC20::approveCall::abi_decode(&sent[0].data).unwrap();
    assert_eq!(approve.spender, router);
    assert_eq!(approve.amount, ether("1"));

    assert_eq!(sent[1].to, router);
    let swap = ISwapRouter02::exactInputSingleCall::abi_decode(&sent[1].data).unwrap();
    assert_eq!(swap.params.tokenIn, weth);
    assert_eq!(swap.params.tokenOut, usdc_address);
    assert_eq!(swap.params.recipient, OWNER);
    assert_eq!(swap.params.amountOutMinimum, quote);

    assert_eq!(sent[2].to, usdc_address);
    let delivery = IERC20::transferCall::abi_decode(&sent[2].data).unwrap();
    assert_eq!(delivery.to, BOB);
    assert_eq!(delivery.amount, quote);
}

#[tokio::test]
async fn reverted_transfer_is_reported() {
    let usdc_address = token_address(BASE_SEPOLIA, "USDC");
    let harness = Harness::new(
        MockChain::new(BASE_SEPOLIA)
            .with_token(usdc_address, usdc("100"))
            .reverting_calls_to(usdc_address),
        MockResolver::default(),
        MockExtractor::returning(input(
            "transfer",
            Some("USDC"),
            None,
            "base sepolia",
            Some(&BOB.to_string()),
            "1",
        )),
    );

    let replies = harness.send("/transfer 1 USDC").await;

    assert_eq!(replies.len(), 1);
    assert!(
        replies[0].starts_with("The transfer transaction failed"),
        "{}",
        replies[0]
    );
}

#[tokio::test]
async fn missing_fields_are_listed() {
    let harness = Harness::new(
        MockChain::new(BASE_SEPOLIA),
        MockResolver::default(),
        MockExtractor::returning(onchain_agent::agent::IntentInput {
            action: Some("transfer".to_string()),
            chain: Some("base sepolia".to_string()),
            ..Default::default()
        }),
    );

    let replies = harness.send("/transaction send some money").await;

    assert_eq!(
        replies,
        vec!["Your prompt is missing required fields: token1, address, amount.".to_string()]
    );
    assert_eq!(harness.connector.connects(), 0);
}

#[tokio::test]
async fn extraction_without_completion_is_reported() {
    let harness = Harness::new(
        MockChain::new(BASE_SEPOLIA),
        MockResolver::default(),
        MockExtractor::default(),
    );

    let replies = harness.send("/transaction do something").await;

    assert_eq!(replies, vec!["I was unable to process your request".to_string()]);
    assert!(harness.chain.sent().is_empty());
}

// ── Conversation commands ───────────────────────────────────

#[tokio::test]
async fn receive_shows_funding_address() {
    let harness = Harness::new(
        MockChain::new(BASE_SEPOLIA),
        MockResolver::default(),
        MockExtractor::default(),
    );

    let replies = harness.send("/receive").await;

    assert_eq!(replies, vec![format!("Send your money to the account {OWNER}")]);
}

#[tokio::test]
async fn ask_uses_knowledge_base() {
    let harness = Harness::with_knowledge(
        MockChain::new(BASE_SEPOLIA),
        MockResolver::default(),
        MockExtractor::default(),
        MockKnowledge {
            answer: Some("A shared ledger.".to_string()),
        },
    );

    assert_eq!(
        harness.send("/ask What is a blockchain?").await,
        vec!["A shared ledger.".to_string()]
    );
    assert_eq!(
        harness.send("/ask").await,
        vec!["Please provide a valid query.".to_string()]
    );
}

#[tokio::test]
async fn ask_without_answer() {
    let harness = Harness::new(
        MockChain::new(BASE_SEPOLIA),
        MockResolver::default(),
        MockExtractor::default(),
    );

    assert_eq!(
        harness.send("/ask anything").await,
        vec!["I don't know the answer to that question.".to_string()]
    );
}

#[tokio::test]
async fn plain_text_gets_help() {
    let harness = Harness::new(
        MockChain::new(BASE_SEPOLIA),
        MockResolver::default(),
        MockExtractor::default(),
    );

    let replies = harness.send("hello there").await;

    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("/transaction"));
    assert!(replies[0].contains("Base Sepolia"));
    assert_eq!(harness.extractor.calls(), 0);
}

#[tokio::test]
async fn mistyped_command_gets_suggestion() {
    let harness = Harness::new(
        MockChain::new(BASE_SEPOLIA),
        MockResolver::default(),
        MockExtractor::default(),
    );

    let replies = harness.send("/trasnfer 1 ETH").await;

    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("/transfer"), "{}", replies[0]);
    assert_eq!(harness.extractor.calls(), 0);
}

#[test]
fn sepolia_weth_matches_registry() {
    assert_eq!(
        token_address(SEPOLIA, "WETH"),
        address!("fFf9976782d46CC05630D1f6eBAb18b2324d6B14")
    );
}
