//! Funding balance checks.

use alloy_primitives::U256;
use rust_decimal::Decimal;

use crate::chain::{self, Account, ChainClient, units};
use crate::error::IntentError;
use crate::registry::{ChainProfile, TokenAddress, TokenSpec};

/// Balance observed at validation time and the amount it must exceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub symbol: String,
    pub have_units: U256,
    /// `None` when the balance is too large for the decimal type.
    pub have: Option<Decimal>,
    pub need: Decimal,
}

/// Read the funding balance of `token` and require it to exceed `amount`.
///
/// Equality fails: the difference is left for fees.
pub async fn check_sufficient(
    client: &dyn ChainClient,
    profile: &ChainProfile,
    account: &Account,
    token: &TokenSpec,
    amount: &str,
) -> Result<BalanceSnapshot, IntentError> {
    let need = units::parse_amount(amount).map_err(|source| IntentError::InvalidAmount {
        amount: amount.to_string(),
        source,
    })?;

    let have_units = match token.address {
        TokenAddress::Native => client.native_balance(account.address).await,
        TokenAddress::Contract(contract) => {
            chain::token_balance(client, contract, account.address).await
        }
    }
    .map_err(|source| IntentError::BalanceUnavailable {
        chain: profile.canonical_name.clone(),
        source,
    })?;

    let have = units::from_base_units(have_units, token.decimals);
    let snapshot = BalanceSnapshot {
        symbol: token.symbol.clone(),
        have_units,
        have,
        need,
    };

    match have {
        Some(have) if have <= need => {
            tracing::info!(
                chain = %profile.canonical_name,
                token = %token.symbol,
                %have,
                %need,
                "Insufficient funding balance"
            );
            Err(IntentError::InsufficientFunds {
                token: token.symbol.clone(),
                chain: profile.canonical_name.clone(),
                have,
                need,
            })
        }
        _ => Ok(snapshot),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, TxHash};
    use alloy_sol_types::SolValue;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    use crate::chain::{AccountKind, TxReceipt, TxRequest};
    use crate::error::{ChainError, ErrorKind};
    use crate::registry::CapabilityRegistry;

    struct FixedBalances {
        native: U256,
        token: U256,
    }

    #[async_trait]
    impl ChainClient for FixedBalances {
        async fn chain_id(&self) -> Result<u64, ChainError> {
            Ok(84532)
        }

        async fn native_balance(&self, _owner: Address) -> Result<U256, ChainError> {
            Ok(self.native)
        }

        async fn call(&self, _to: Address, _data: Bytes) -> Result<Bytes, ChainError> {
            Ok(Bytes::from(self.token.abi_encode()))
        }

        async fn send_transaction(&self, _from: &Account, _tx: TxRequest) -> Result<TxHash, ChainError> {
            unreachable!()
        }

        async fn wait_for_receipt(&self, _tx_hash: TxHash) -> Result<TxReceipt, ChainError> {
            unreachable!()
        }
    }

    fn account() -> Account {
        Account {
            kind: AccountKind::Simple,
            address: Address::repeat_byte(0x11),
            owner: Address::repeat_byte(0x11),
            chain_id: 84532,
        }
    }

    fn wei(ether: &str) -> U256 {
        units::to_base_units(ether, 18, "ETH").unwrap()
    }

    #[tokio::test]
    async fn equal_balance_is_insufficient() {
        let registry = CapabilityRegistry::builtin().unwrap();
        let profile = registry.resolve_chain("base sepolia").unwrap();
        let eth = profile.token("ETH").unwrap();
        let client = FixedBalances {
            native: wei("0.01"),
            token: U256::ZERO,
        };

        let err = check_sufficient(&client, profile, &account(), eth, "0.01")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        match err {
            IntentError::InsufficientFunds { have, need, .. } => {
                assert_eq!(have, dec!(0.01));
                assert_eq!(need, dec!(0.01));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn strictly_larger_balance_passes() {
        let registry = CapabilityRegistry::builtin().unwrap();
        let profile = registry.resolve_chain("base sepolia").unwrap();
        let eth = profile.token("ETH").unwrap();
        let client = FixedBalances {
            native: wei("0.010000000000000001"),
            token: U256::ZERO,
        };

        let snapshot = check_sufficient(&client, profile, &account(), eth, "0.01")
            .await
            .unwrap();
        assert_eq!(snapshot.need, dec!(0.01));
        assert_eq!(snapshot.have, Some(dec!(0.010000000000000001)));
    }

    #[tokio::test]
    async fn token_balances_use_token_decimals() {
        let registry = CapabilityRegistry::builtin().unwrap();
        let profile = registry.resolve_chain("base sepolia").unwrap();
        let usdc = profile.token("USDC").unwrap();
        let client = FixedBalances {
            native: U256::ZERO,
            token: U256::from(2_500_000u64),
        };

        let snapshot = check_sufficient(&client, profile, &account(), usdc, "2")
            .await
            .unwrap();
        assert_eq!(snapshot.have, Some(dec!(2.5)));

        let err = check_sufficient(&client, profile, &account(), usdc, "2.5")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    }

    #[tokio::test]
    async fn balances_beyond_decimal_range_are_sufficient() {
        let registry = CapabilityRegistry::builtin().unwrap();
        let profile = registry.resolve_chain("base sepolia").unwrap();
        let eth = profile.token("ETH").unwrap();
        let client = FixedBalances {
            native: U256::MAX,
            token: U256::ZERO,
        };

        let snapshot = check_sufficient(&client, profile, &account(), eth, "1000")
            .await
            .unwrap();
        assert_eq!(snapshot.have, None);
    }
}
