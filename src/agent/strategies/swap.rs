use alloy_primitives::aliases::{U24, U160};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::agent::strategies::transfer::send_token;
use crate::agent::strategies::{ExecutionStrategy, StrategyOutcome};
use crate::agent::{Action, ValidatedIntent};
use crate::chain::abi::{IERC20, IQuoterV2, ISwapRouter02, IUniswapV3Factory};
use crate::chain::{ChainSession, TxRequest};
use crate::error::ExecutionError;
use crate::registry::{SwapVenue, TokenSpec};

/// Quote-then-execute single-pool swap on the chain's Uniswap V3 venue.
///
/// The minimum output is the quoted amount itself: any price movement
/// between quote and execution makes the swap revert.
#[derive(Debug, Default)]
pub struct SwapStrategy;

impl SwapStrategy {
    pub fn new() -> Self {
        Self
    }
}

struct SwapLeg {
    venue: SwapVenue,
    token_in: Address,
    token_out: Address,
    fee: U24,
}

fn contract_of(token: &TokenSpec) -> Result<Address, ExecutionError> {
    token.contract().ok_or_else(|| ExecutionError::Unsupported {
        reason: format!("{} cannot be swapped directly; swaps use ERC-20 tokens.", token.symbol),
    })
}

impl SwapStrategy {
    fn leg(
        &self,
        session: &ChainSession,
        intent: &ValidatedIntent,
    ) -> Result<(SwapLeg, TokenSpec), ExecutionError> {
        let venue = session
            .profile
            .swap_venue
            .ok_or_else(|| ExecutionError::Unsupported {
                reason: format!(
                    "{} has no swap venue configured.",
                    session.profile.canonical_name
                ),
            })?;
        let target = intent
            .target_token()
            .cloned()
            .ok_or_else(|| ExecutionError::Unsupported {
                reason: "A swap needs a target token.".to_string(),
            })?;
        let leg = SwapLeg {
            venue,
            token_in: contract_of(intent.source_token())?,
            token_out: contract_of(&target)?,
            fee: U24::from(venue.pool_fee),
        };
        Ok((leg, target))
    }

    async fn quote(
        &self,
        session: &ChainSession,
        intent: &ValidatedIntent,
        leg: &SwapLeg,
        target: &TokenSpec,
    ) -> Result<U256, ExecutionError> {
        let pool = session
            .read(
                leg.venue.factory,
                &IUniswapV3Factory::getPoolCall {
                    tokenA: leg.token_in,
                    tokenB: leg.token_out,
                    fee: leg.fee,
                },
            )
            .await
            .map_err(ExecutionError::failed("quote"))?;
        if pool == Address::ZERO {
            return Err(ExecutionError::PoolNotFound {
                token_in: intent.source_token().symbol.clone(),
                token_out: target.symbol.clone(),
                fee: leg.venue.pool_fee,
                chain: session.profile.canonical_name.clone(),
            });
        }

        let quote = session
            .read(
                leg.venue.quoter,
                &IQuoterV2::quoteExactInputSingleCall {
                    params: IQuoterV2::QuoteExactInputSingleParams {
                        tokenIn: leg.token_in,
                        tokenOut: leg.token_out,
                        amountIn: intent.amount_units(),
                        fee: leg.fee,
                        sqrtPriceLimitX96: U160::ZERO,
                    },
                },
            )
            .await
            .map_err(ExecutionError::failed("quote"))?;
        Ok(quote.amountOut)
    }
}

#[async_trait]
impl ExecutionStrategy for SwapStrategy {
    fn action(&self) -> Action {
        Action::Swap
    }

    async fn execute(
        &self,
        session: &ChainSession,
        intent: &ValidatedIntent,
    ) -> Result<StrategyOutcome, ExecutionError> {
        let (leg, target) = self.leg(session, intent)?;
        let intent_id = intent.intent().intent_id;
        let chain = &session.profile.canonical_name;

        let amount_out = self.quote(session, intent, &leg, &target).await?;
        if amount_out.is_zero() {
            return Err(ExecutionError::ZeroQuote {
                token_in: intent.source_token().symbol.clone(),
                token_out: target.symbol.clone(),
            });
        }
        tracing::info!(
            %intent_id,
            %chain,
            amount_in = %intent.amount_units(),
            %amount_out,
            "Swap quoted"
        );

        session
            .send_and_confirm(TxRequest::contract_call(
                leg.token_in,
                &IERC20::approveCall {
                    spender: leg.venue.router,
                    amount: intent.amount_units(),
                },
            ))
            .await
            .map_err(ExecutionError::failed("approval"))?;

        let receipt = session
            .send_and_confirm(TxRequest::contract_call(
                leg.venue.router,
                &ISwapRouter02::exactInputSingleCall {
                    params: ISwapRouter02::ExactInputSingleParams {
                        tokenIn: leg.token_in,
                        tokenOut: leg.token_out,
                        fee: leg.fee,
                        recipient: session.account.address,
                        amountIn: intent.amount_units(),
                        amountOutMinimum: amount_out,
                        sqrtPriceLimitX96: U160::ZERO,
                    },
                },
            ))
            .await
            .map_err(ExecutionError::failed("swap"))?;
        tracing::info!(%intent_id, %chain, tx_hash = %receipt.tx_hash, "Swap executed");

        let recipient = intent.recipient();
        let follow_up = if recipient != session.account.address {
            tracing::info!(%intent_id, %chain, %recipient, "Delivering swap output");
            Some(send_token(session, &target, recipient, amount_out, "delivery").await)
        } else {
            None
        };

        Ok(StrategyOutcome {
            tx_hash: receipt.tx_hash,
            follow_up,
        })
    }
}
