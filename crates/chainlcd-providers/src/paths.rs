//! Relative request paths for the Cosmos SDK REST API and Tendermint RPC.
//!
//! Paths only; decoding the responses is left to callers.

use chainlcd_core::LCD_PROBE_PATH;

/// Page size used for validator-scoped listings.
pub const VALIDATOR_PAGE_LIMIT: u32 = 1000;

/// Staking bond status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondStatus {
    Bonded,
    Unbonding,
    Unbonded,
}

impl BondStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bonded => "BOND_STATUS_BONDED",
            Self::Unbonding => "BOND_STATUS_UNBONDING",
            Self::Unbonded => "BOND_STATUS_UNBONDED",
        }
    }
}

/// Governance proposal status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalStatus {
    DepositPeriod,
    VotingPeriod,
    Passed,
    Rejected,
}

impl ProposalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DepositPeriod => "PROPOSAL_STATUS_DEPOSIT_PERIOD",
            Self::VotingPeriod => "PROPOSAL_STATUS_VOTING_PERIOD",
            Self::Passed => "PROPOSAL_STATUS_PASSED",
            Self::Rejected => "PROPOSAL_STATUS_REJECTED",
        }
    }
}

pub fn node_info() -> &'static str {
    LCD_PROBE_PATH
}

/// Tendermint RPC node status.
pub fn rpc_status() -> &'static str {
    "/status"
}

pub fn balances(address: &str) -> String {
    format!("/cosmos/bank/v1beta1/balances/{address}")
}

pub fn delegations(delegator: &str) -> String {
    format!("/cosmos/staking/v1beta1/delegations/{delegator}")
}

pub fn delegator_rewards(delegator: &str) -> String {
    format!("/cosmos/distribution/v1beta1/delegators/{delegator}/rewards")
}

pub fn unbonding_delegations(delegator: &str) -> String {
    format!("/cosmos/staking/v1beta1/delegators/{delegator}/unbonding_delegations")
}

pub fn validator(valoper: &str) -> String {
    format!("/cosmos/staking/v1beta1/validators/{valoper}")
}

pub fn validator_delegations(valoper: &str) -> String {
    format!(
        "/cosmos/staking/v1beta1/validators/{valoper}/delegations?pagination.limit={VALIDATOR_PAGE_LIMIT}"
    )
}

pub fn validator_unbonding_delegations(valoper: &str) -> String {
    format!(
        "/cosmos/staking/v1beta1/validators/{valoper}/unbonding_delegations?pagination.limit={VALIDATOR_PAGE_LIMIT}"
    )
}

pub fn validator_commission(valoper: &str) -> String {
    format!("/cosmos/distribution/v1beta1/validators/{valoper}/commission")
}

pub fn validators(status: BondStatus, limit: u32) -> String {
    format!(
        "/cosmos/staking/v1beta1/validators?status={}&pagination.limit={limit}",
        status.as_str()
    )
}

/// Newest first.
pub fn proposals(status: ProposalStatus, limit: u32) -> String {
    format!(
        "/cosmos/gov/v1beta1/proposals?proposal_status={}&pagination.limit={limit}&pagination.reverse=true",
        status.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_paths() {
        assert_eq!(balances("cosmos1abc"), "/cosmos/bank/v1beta1/balances/cosmos1abc");
        assert_eq!(
            delegator_rewards("cosmos1abc"),
            "/cosmos/distribution/v1beta1/delegators/cosmos1abc/rewards"
        );
    }

    #[test]
    fn validator_listing_carries_filters() {
        assert_eq!(
            validators(BondStatus::Bonded, 300),
            "/cosmos/staking/v1beta1/validators?status=BOND_STATUS_BONDED&pagination.limit=300"
        );
        assert!(validator_delegations("cosmosvaloper1x").ends_with("?pagination.limit=1000"));
    }

    #[test]
    fn proposals_are_newest_first() {
        let p = proposals(ProposalStatus::VotingPeriod, 100);
        assert!(p.contains("PROPOSAL_STATUS_VOTING_PERIOD"));
        assert!(p.ends_with("pagination.reverse=true"));
    }
}
