//! 回跑结算合约 ABI 绑定

use ethers::prelude::*;

// 合约在两个池子之间完成一次往返兑换，按百分比留存利润
abigen!(
    BlindBackrun,
    r#"[
        function executeArbitrage(address firstPairAddress, address secondPairAddress, uint256 percentageToKeep) external payable
    ]"#
);
