//! Contract bindings and calldata builders for the faucet tokens and the
//! swap router.

use crate::errors::{BotError, BotResult};
use alloy::primitives::{
    aliases::{U160, U24},
    Address, Bytes, U256,
};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
    }

    interface IFaucetToken {
        function mint() external;
    }

    interface ISwapRouter {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 deadline;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 sqrtPriceLimitX96;
        }

        function exactInputSingle(ExactInputSingleParams calldata params) external payable returns (uint256 amountOut);
    }
}

/// `mint()`
pub const MINT_SELECTOR: [u8; 4] = [0x12, 0x49, 0xc5, 0x8b];

pub fn mint_calldata() -> Bytes {
    Bytes::from_static(&MINT_SELECTOR)
}

pub fn balance_of_calldata(account: Address) -> Bytes {
    IERC20::balanceOfCall { account }.abi_encode().into()
}

pub fn allowance_calldata(owner: Address, spender: Address) -> Bytes {
    IERC20::allowanceCall { owner, spender }.abi_encode().into()
}

/// Unlimited approval
pub fn approve_max_calldata(spender: Address) -> Bytes {
    IERC20::approveCall {
        spender,
        amount: U256::MAX,
    }
    .abi_encode()
    .into()
}

/// Fixed-shape `exactInputSingle` parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapParams {
    pub token_in: Address,
    pub token_out: Address,
    pub fee: u32,
    pub recipient: Address,
    pub deadline: u64,
    pub amount_in: U256,
    pub amount_out_minimum: U256,
}

impl SwapParams {
    pub fn calldata(&self) -> Bytes {
        ISwapRouter::exactInputSingleCall {
            params: ISwapRouter::ExactInputSingleParams {
                tokenIn: self.token_in,
                tokenOut: self.token_out,
                fee: U24::from(self.fee),
                recipient: self.recipient,
                deadline: U256::from(self.deadline),
                amountIn: self.amount_in,
                amountOutMinimum: self.amount_out_minimum,
                sqrtPriceLimitX96: U160::ZERO,
            },
        }
        .abi_encode()
        .into()
    }
}

/// Decode a single `uint256` return value.
pub fn decode_uint256(data: &[u8]) -> BotResult<U256> {
    if data.len() < 32 {
        return Err(BotError::Encoding(format!(
            "expected 32-byte uint256 return, got {} bytes",
            data.len()
        )));
    }
    Ok(U256::from_be_slice(&data[..32]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_mint_selector_matches_signature() {
        assert_eq!(IFaucetToken::mintCall::SELECTOR, MINT_SELECTOR);
        assert_eq!(&mint_calldata()[..], &[0x12, 0x49, 0xc5, 0x8b]);
    }

    #[test]
    fn test_erc20_calldata_shapes() {
        let owner = address!("00000000000000000000000000000000000000aa");
        let router = address!("16a811adc55A99b4456F62c54F12D3561559a268");

        let balance = balance_of_calldata(owner);
        assert_eq!(&balance[..4], &IERC20::balanceOfCall::SELECTOR);
        assert_eq!(balance.len(), 4 + 32);

        let allowance = allowance_calldata(owner, router);
        assert_eq!(&allowance[..4], &IERC20::allowanceCall::SELECTOR);
        assert_eq!(allowance.len(), 4 + 64);

        let approve = approve_max_calldata(router);
        assert_eq!(&approve[..4], &IERC20::approveCall::SELECTOR);
        assert_eq!(&approve[36..68], &[0xff; 32]);
    }

    #[test]
    fn test_swap_calldata_layout() {
        let params = SwapParams {
            token_in: address!("2619090fcfdb99a8ccf51c76c9467f7375040eeb"),
            token_out: address!("a8f030218d7c26869cadd46c5f10129e635cd565"),
            fee: 3_000,
            recipient: address!("00000000000000000000000000000000000000aa"),
            deadline: 1_700_000_600,
            amount_in: U256::from(12_345u64),
            amount_out_minimum: U256::ZERO,
        };
        let data = params.calldata();

        // static tuple: 8 words after the selector
        assert_eq!(data.len(), 4 + 8 * 32);
        assert_eq!(&data[..4], &ISwapRouter::exactInputSingleCall::SELECTOR);

        let word = |i: usize| U256::from_be_slice(&data[4 + i * 32..4 + (i + 1) * 32]);
        assert_eq!(word(2), U256::from(3_000u64));
        assert_eq!(word(4), U256::from(1_700_000_600u64));
        assert_eq!(word(5), U256::from(12_345u64));
        assert_eq!(word(6), U256::ZERO);
        assert_eq!(word(7), U256::ZERO);
    }

    #[test]
    fn test_decode_uint256() {
        let mut word = [0u8; 32];
        word[31] = 42;
        assert_eq!(decode_uint256(&word).unwrap(), U256::from(42u64));
        assert!(decode_uint256(&word[..10]).is_err());
    }
}
