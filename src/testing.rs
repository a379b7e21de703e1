//! Shared scenario fixtures for unit tests

use chrono::NaiveDate;

use crate::drivers::*;
use crate::projection::{ProjectionConfig, ProjectionResult, StatementAssembler};
use crate::scenario::{OpeningBalances, Scenario};

/// 100 customers at $100/month, 5% monthly churn, $10,000/month fixed cost,
/// flat 21% income tax, twelve months
pub(crate) fn reference_scenario() -> Scenario {
    let mut stream = RevenueStream::subscription("Core plan", 100.0, 100.0);
    stream.churn_rate = MonthlySchedule::constant(0.05);

    Scenario {
        name: "Reference".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        horizon_months: 12,
        opening: OpeningBalances {
            cash: 1_000_000.0,
            paid_in_capital: 1_000_000.0,
            ..Default::default()
        },
        revenue: RevenuePlan::with_streams(vec![stream]),
        headcount: HeadcountPlan::default(),
        costs: CostPlan::with_items(vec![CostItem::fixed("Operating overhead", 10_000.0)]),
        taxes: TaxRules::flat(0.21),
        financing: FinancingAssumptions::default(),
        capex: CapexPlan::default(),
        working_capital: WorkingCapitalPolicy::default(),
        valuation: ValuationAssumptions::default(),
    }
}

/// A scenario touching every driver: deferral, services, headcount, all cost
/// categories, progressive and indirect taxes, loans, capex and working capital
pub(crate) fn rich_scenario() -> Scenario {
    let mut monthly = RevenueStream::subscription("Monthly", 200.0, 80.0);
    monthly.new_customers = MonthlySchedule::constant(25.0);
    monthly.churn_rate = MonthlySchedule::constant(0.03);
    monthly.expansion_rate = MonthlySchedule::constant(0.01);
    monthly.contraction_rate = MonthlySchedule::constant(0.002);
    monthly.discount_rate = MonthlySchedule::constant(0.05);
    monthly.services = Some(ServicesRevenue {
        attach_rate: 0.4,
        average_price: 500.0,
    });
    monthly.transactional = Some(TransactionalRevenue {
        volume: MonthlySchedule::constant(4_000.0),
        fee: 0.15,
    });

    let mut annual = RevenueStream::subscription("Annual", 40.0, 900.0);
    annual.new_customers = MonthlySchedule::constant(3.0);
    annual.churn_rate = MonthlySchedule::constant(0.01);
    annual.price_growth_rate = MonthlySchedule::constant(0.002);
    annual.deferral = DeferralSchedule::straight_line(12);
    let mut seasonal = vec![1.0; 12];
    seasonal[11] = 1.3;
    annual.seasonality = SeasonalPattern { values: seasonal };

    let mut engineering = AreaPlan::new("Engineering", 6.0, 140_000.0);
    engineering.loaded_cost_multiplier = 1.2;
    engineering.annual_raise = 0.04;
    engineering.events = vec![
        HeadcountEvent::hire(3, 2.0).with_ramp(0.5),
        HeadcountEvent::departure(9, 1.0),
    ];
    let mut support = AreaPlan::new("Support", 3.0, 60_000.0);
    support.allocation = CostAllocation::Cogs;
    support.benefits_per_head = 400.0;
    let mut sales = AreaPlan::new("Sales", 2.0, 100_000.0);
    sales.events = vec![HeadcountEvent::hire(6, 1.0)];

    let hosting = ContractTerms {
        start_month: 1,
        end_month: None,
        monthly_amount: 4_000.0,
        steps: vec![ContractStep {
            from_month: 10,
            monthly_amount: 5_000.0,
        }],
        escalation_pct: 0.05,
        escalation_frequency_months: 12,
        usage: Some(UsageFee {
            driver: CostDriver::Customers,
            rate: 1.5,
        }),
        minimum_commitment: 4_500.0,
    };

    let mut costs = CostPlan::with_items(vec![
        CostItem::fixed("Rent", 8_000.0).in_center(CostCenter::GeneralAdministrative),
        CostItem::variable("Payment processing", CostDriver::Billings, 0.029)
            .allocated_to(CostAllocation::Cogs),
        CostItem::variable("Paid acquisition", CostDriver::NewCustomers, 300.0).in_center(CostCenter::Marketing),
        CostItem::supplier("Hosting", hosting)
            .allocated_to(CostAllocation::Cogs)
            .in_center(CostCenter::Engineering),
    ]);
    costs.cogs_pct_of_revenue = 0.02;

    let taxes = TaxRules {
        income_tax: vec![
            IncomeTaxComponent {
                jurisdiction: "federal".to_string(),
                schedule: RateSchedule::Flat { rate: 0.21 },
            },
            IncomeTaxComponent {
                jurisdiction: "state".to_string(),
                schedule: RateSchedule::Progressive {
                    brackets: vec![
                        TaxBracket { threshold: 0.0, rate: 0.02 },
                        TaxBracket { threshold: 250_000.0, rate: 0.06 },
                    ],
                },
            },
        ],
        indirect: vec![
            IndirectTax {
                name: "Sales tax".to_string(),
                base: IndirectTaxBase::GrossRevenue,
                rate: 0.03,
            },
            IndirectTax {
                name: "Employer payroll tax".to_string(),
                base: IndirectTaxBase::Payroll,
                rate: 0.0765,
            },
        ],
        carryforward: CarryforwardPolicy {
            enabled: true,
            max_offset_fraction: 0.8,
        },
    };

    let mut bridge = FinancingEvent::term_loan("Venture debt", 4, 250_000.0, 0.11, 24);
    bridge.instrument = Instrument::TermLoan {
        annual_rate: 0.11,
        term_months: 24,
        grace_months: 6,
    };
    let mut seed = FinancingEvent::equity("Seed extension", 2, 1_500_000.0);
    seed.instrument = Instrument::Equity {
        pre_money_valuation: Some(12_000_000.0),
    };

    Scenario {
        name: "Rich".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
        horizon_months: 24,
        opening: OpeningBalances {
            cash: 800_000.0,
            accounts_receivable: 20_000.0,
            fixed_assets: 90_000.0,
            accumulated_depreciation: 30_000.0,
            fixed_asset_remaining_life_months: Some(20),
            accounts_payable: 12_000.0,
            deferred_revenue: 36_000.0,
            deferred_revenue_release_months: 6,
            debt: 100_000.0,
            debt_annual_rate: 0.08,
            paid_in_capital: 2_500_000.0,
            tax_loss_carryforward: 150_000.0,
            ..Default::default()
        },
        revenue: RevenuePlan {
            streams: vec![monthly, annual],
            other_recurring_revenue: MonthlySchedule::constant(1_000.0),
            professional_services_revenue: MonthlySchedule::zero().with_override(5, 12_000.0),
        },
        headcount: HeadcountPlan {
            areas: vec![engineering, support, sales],
        },
        costs,
        taxes,
        financing: FinancingAssumptions {
            events: vec![
                seed,
                bridge,
                FinancingEvent {
                    name: "Bridge note".to_string(),
                    month: 8,
                    amount: 100_000.0,
                    instrument: Instrument::BulletLoan {
                        annual_rate: 0.09,
                        term_months: 12,
                    },
                },
            ],
            minimum_cash_balance: Some(250_000.0),
        },
        capex: CapexPlan {
            items: vec![
                CapexItem {
                    name: "Laptops".to_string(),
                    month: 3,
                    amount: 12_000.0,
                    useful_life_months: 24,
                    salvage_value: 0.0,
                },
                CapexItem {
                    name: "Office fit-out".to_string(),
                    month: 7,
                    amount: 60_000.0,
                    useful_life_months: 60,
                    salvage_value: 6_000.0,
                },
            ],
        },
        working_capital: WorkingCapitalPolicy {
            dso_days: 35.0,
            dpo_days: 25.0,
            dio_days: 5.0,
        },
        valuation: ValuationAssumptions {
            methods: vec![
                ValuationMethod::Dcf(DcfInputs {
                    discount_rate: 0.25,
                    basis: CashFlowBasis::Fcff,
                    terminal_methods: vec![
                        TerminalValueMethod::PerpetuityGrowth { growth_rate: 0.03 },
                        TerminalValueMethod::ExitMultiple {
                            metric: Metric::Arr,
                            window: MetricWindow::RunRate,
                            multiple: 6.0,
                        },
                    ],
                }),
                ValuationMethod::Multiples(MultiplesInputs {
                    applications: vec![
                        MultipleSpec {
                            metric: Metric::NetRevenue,
                            window: MetricWindow::TrailingTwelveMonths,
                            multiple: 5.0,
                        },
                        MultipleSpec {
                            metric: Metric::Arr,
                            window: MetricWindow::RunRate,
                            multiple: 7.0,
                        },
                    ],
                }),
                ValuationMethod::VcMethod(VcInputs {
                    exit: ExitValue::Explicit { value: 150_000_000.0 },
                    years_to_exit: 6.0,
                    required_return: RequiredReturn::AnnualRate { rate: 0.45 },
                    investment: None,
                    financing_rounds: 3,
                    dilution_per_round: 0.2,
                    probability_of_success: 0.6,
                }),
                ValuationMethod::Scorecard(ScorecardInputs {
                    weights: [("team", 0.3), ("market", 0.25), ("product", 0.15), ("competition", 0.3)]
                        .into_iter()
                        .map(|(k, w)| (k.to_string(), w))
                        .collect(),
                    scores: [("team".to_string(), 1.2), ("competition".to_string(), 0.9)]
                        .into_iter()
                        .collect(),
                }),
            ],
        },
    }
}

/// Project a scenario with default configuration, bypassing valuation
pub(crate) fn project(scenario: &Scenario) -> ProjectionResult {
    StatementAssembler::new(scenario, ProjectionConfig::default())
        .project()
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_are_valid() {
        assert!(reference_scenario().validate().is_ok());
        assert!(rich_scenario().validate().is_ok());
    }
}
