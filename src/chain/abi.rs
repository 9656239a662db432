//! Contract interfaces used by the execution strategies and ENS lookups.

use alloy_sol_types::sol;

sol! {
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

sol! {
    interface IWETH9 {
        function deposit() external payable;
    }
}

sol! {
    interface IUniswapV3Factory {
        function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address pool);
    }
}

sol! {
    interface IQuoterV2 {
        struct QuoteExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint256 amountIn;
            uint24 fee;
            uint160 sqrtPriceLimitX96;
        }

        function quoteExactInputSingle(
            QuoteExactInputSingleParams memory params
        ) external returns (
            uint256 amountOut,
            uint160 sqrtPriceX96After,
            uint32 initializedTicksCrossed,
            uint256 gasEstimate
        );
    }
}

// SwapRouter02 drops the deadline field that the original SwapRouter had.
sol! {
    interface ISwapRouter02 {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 sqrtPriceLimitX96;
        }

        function exactInputSingle(ExactInputSingleParams calldata params) external payable returns (uint256 amountOut);
    }
}

sol! {
    interface IEnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }
}

sol! {
    interface IEnsResolver {
        function addr(bytes32 node) external view returns (address);
    }
}
