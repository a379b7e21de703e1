//! Carry-state threaded from one projection month to the next

use serde::{Deserialize, Serialize};

use super::statements::BalanceSheet;
use crate::engines::{DepreciationState, FinancingState, HeadcountState, RevenueState};
use crate::scenario::{OpeningBalances, Scenario};

/// Everything month `t` needs from month `t - 1`
///
/// A state is never mutated once built; each step of the fold reads the prior
/// state and returns a fresh one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarryState {
    /// Last completed projection month (0 before the first month)
    pub month: u32,

    /// Closing balance sheet of the last completed month
    pub balance_sheet: BalanceSheet,

    /// Unused tax losses available to offset future profits
    pub tax_loss_carryforward: f64,

    pub revenue: RevenueState,
    pub headcount: HeadcountState,
    pub financing: FinancingState,
    pub depreciation: DepreciationState,
}

impl CarryState {
    /// State before month 1, built from the scenario's opening balances
    pub fn from_scenario(scenario: &Scenario) -> Self {
        let opening = &scenario.opening;
        let balance_sheet = opening_balance_sheet(opening);
        Self {
            month: 0,
            tax_loss_carryforward: opening.tax_loss_carryforward,
            revenue: RevenueState::opening(
                &scenario.revenue,
                opening.deferred_revenue,
                opening.deferred_revenue_release_months,
            ),
            headcount: HeadcountState::opening(&scenario.headcount),
            financing: FinancingState::opening(opening.debt, opening.debt_annual_rate),
            depreciation: DepreciationState::opening(
                balance_sheet.net_fixed_assets(),
                opening.fixed_asset_remaining_life_months,
            ),
            balance_sheet,
        }
    }
}

/// Opening balance sheet; retained earnings absorb whatever makes it balance
pub fn opening_balance_sheet(opening: &OpeningBalances) -> BalanceSheet {
    let mut bs = BalanceSheet {
        cash: opening.cash,
        accounts_receivable: opening.accounts_receivable,
        inventory: opening.inventory,
        fixed_assets_gross: opening.fixed_assets,
        accumulated_depreciation: opening.accumulated_depreciation,
        accounts_payable: opening.accounts_payable,
        deferred_revenue: opening.deferred_revenue,
        debt: opening.debt,
        paid_in_capital: opening.paid_in_capital,
        retained_earnings: 0.0,
    };
    bs.retained_earnings = bs.total_assets() - bs.total_liabilities() - bs.paid_in_capital;
    bs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opening_sheet_balances() {
        let opening = OpeningBalances {
            cash: 500_000.0,
            accounts_receivable: 40_000.0,
            fixed_assets: 60_000.0,
            accumulated_depreciation: 10_000.0,
            accounts_payable: 15_000.0,
            deferred_revenue: 25_000.0,
            debt: 100_000.0,
            paid_in_capital: 1_000_000.0,
            ..Default::default()
        };
        let bs = opening_balance_sheet(&opening);
        assert_eq!(bs.total_assets(), 590_000.0);
        assert_eq!(bs.retained_earnings, -550_000.0);
        assert_eq!(bs.imbalance(), 0.0);
    }

    #[test]
    fn test_state_starts_before_month_one() {
        let scenario = crate::testing::reference_scenario();
        let state = CarryState::from_scenario(&scenario);
        assert_eq!(state.month, 0);
        assert_eq!(state.headcount.total(), 0.0);
        assert_eq!(state.revenue.streams[0].customers, 100.0);
        assert_eq!(state.balance_sheet.cash, scenario.opening.cash);
    }
}
