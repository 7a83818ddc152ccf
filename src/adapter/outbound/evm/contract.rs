//! Contract bindings for the forge and balance-ledger contracts.

use alloy_sol_types::sol;

sol! {
    #[sol(rpc)]
    interface IForge {
        function mintToken(uint256 id) external;
        function forgeItem(uint256 id) external;
        function tradeItem(uint256 id, uint256 burnId) external;
    }

    #[sol(rpc)]
    interface IGameLogic {
        function balanceOfBatch(address[] accounts, uint256[] ids) external view returns (uint256[] memory);
        function lastMint(address account) external view returns (uint256);
    }
}
