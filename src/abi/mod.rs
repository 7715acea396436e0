use alloy::sol;

// On-chain name -> address directory. Written once per deployment by the
// (out-of-scope) deploy flow; the relay only reads it.
sol! {
    #[sol(rpc)]
    interface IAddressRegistry {
        function getContractAddress(string calldata name) external view returns (address);

        // Admin-only, enforced by the contract. Declared for completeness;
        // the relay never calls it.
        function setContractAddress(string calldata name, address addr) external;

        event ContractAddressSet(string name, address addr);
    }
}

// Software update contract. Business rules (manufacturer allow-list,
// purchase accounting, per-caller authorization) live on-chain.
sol! {
    #[sol(rpc)]
    interface ISoftwareUpdate {
        function registerUpdate(
            string calldata uid,
            string calldata ipfsHash,
            string calldata encryptedKey,
            string calldata hashOfUpdate,
            string calldata description,
            uint256 price,
            string calldata version,
            bytes calldata signature
        ) external;

        function getUpdateInfo(string calldata uid) external view returns (
            string memory ipfsHash,
            string memory encryptedKey,
            string memory hashOfUpdate,
            string memory description,
            uint256 price,
            string memory version,
            bool isAuthorized
        );
    }
}
