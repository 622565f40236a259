//! Solidity event ABIs for the six signatures in §6, generated with
//! `alloy::sol!` the same way the teacher generates bindings for EIP-7683
//! order events.

use alloy::sol;

sol! {
    event IntentInitiated(bytes32 indexed intentId, address indexed asset, uint256 amount, uint256 targetChain, bytes receiver, uint256 tip, uint256 salt);
    event IntentInitiatedWithCall(bytes32 indexed intentId, address indexed asset, uint256 amount, uint256 targetChain, bytes receiver, uint256 tip, uint256 salt, bytes data);

    event IntentFulfilled(bytes32 indexed intentId, address indexed asset, uint256 amount, address indexed receiver);
    event IntentFulfilledWithCall(bytes32 indexed intentId, address indexed asset, uint256 amount, address indexed receiver, bytes data);

    event IntentSettled(bytes32 indexed intentId, address indexed asset, uint256 amount, address indexed receiver, bool fulfilled, address fulfiller, uint256 actualAmount, uint256 paidTip);
    event IntentSettledWithCall(bytes32 indexed intentId, address indexed asset, uint256 amount, address indexed receiver, bool fulfilled, address fulfiller, uint256 actualAmount, uint256 paidTip, bytes data);
}
