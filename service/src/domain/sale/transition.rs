//! Validation of [`Sale`] status transitions.

use super::{Sale, Status, Violation};

/// Checks whether the provided merged [`Sale`] may move from the `from`
/// [`Status`] into its [`Sale::status`].
///
/// Returns every detected [`Violation`], not just the first one. An empty
/// [`Vec`] means the transition is legal.
///
/// A no-op transition (same [`Status`]) is always legal: the per-status
/// requirements were already enforced when the [`Status`] was entered.
#[must_use]
pub fn check(from: Status, merged: &Sale) -> Vec<Violation> {
    let to = merged.status;
    if from == to {
        return Vec::new();
    }

    let mut violations = Vec::new();

    if from.is_terminal() {
        violations.push(Violation::TerminalStatus(from));
    } else if !from.allowed_transitions().contains(&to) {
        violations.push(Violation::TransitionNotAllowed { from, to });
    }

    match to {
        Status::OnApproval => {}
        Status::OnProcessing => {
            if merged.sale_date.is_none() {
                violations.push(Violation::SaleDateRequired(to));
            }
            if merged.sale_price.is_zero() {
                violations.push(Violation::SalePriceRequired(to));
            }
        }
        Status::Sold => {
            if merged.sale_date.is_none() {
                violations.push(Violation::SaleDateRequired(to));
            }
            if !merged.sale_price.is_positive() {
                violations.push(Violation::SalePriceNotPositive(to));
            }
        }
        Status::BonusesIssued => {
            if merged.seller_bonus.is_none() {
                violations.push(Violation::SellerBonusRequired(to));
            }
            if merged.intake_bonus.is_none() {
                violations.push(Violation::IntakeBonusRequired(to));
            }
            if merged.total_bonuses.is_none() {
                violations.push(Violation::TotalBonusesRequired(to));
            }
            if !merged.net_profit.is_positive() {
                violations.push(Violation::NetProfitNotPositive(to));
            }
        }
        Status::CommissionIssued => {
            if from != Status::BonusesIssued {
                violations.push(Violation::CommissionBeforeBonuses);
            }
        }
    }

    violations
}

#[cfg(test)]
mod spec {
    use common::{DateTimeOf, Money};

    use super::{check, Status, Violation};
    use crate::domain::{customer, employee, sale, vehicle, Sale};

    fn sale(status: Status) -> Sale {
        Sale {
            id: sale::Id::new(),
            vehicle_id: vehicle::Id::new(),
            customer_id: customer::Id::new(),
            seller_id: employee::Id::new(),
            intake_employee_id: employee::Id::new(),
            manager_id: None,
            purchase_price: Money::from(5_000_000),
            sale_price: Money::from(6_000_000),
            net_profit: Money::from(1_000_000),
            seller_bonus: None,
            intake_bonus: None,
            manager_bonus: None,
            total_bonuses: None,
            status,
            is_commission_paid: false,
            sale_date: Some(DateTimeOf::now()),
            is_active: true,
            created_at: DateTimeOf::now(),
            updated_at: DateTimeOf::now(),
        }
    }

    #[test]
    fn allows_legal_transitions() {
        for (from, to) in [
            (Status::OnApproval, Status::OnProcessing),
            (Status::OnApproval, Status::Sold),
            (Status::OnProcessing, Status::Sold),
            (Status::OnProcessing, Status::OnApproval),
            (Status::Sold, Status::OnProcessing),
            (Status::BonusesIssued, Status::Sold),
        ] {
            let mut merged = sale(to);
            merged.seller_bonus = Some(Money::from(300_000));
            merged.intake_bonus = Some(Money::from(200_000));
            merged.total_bonuses = Some(Money::from(500_000));

            assert_eq!(check(from, &merged), Vec::new(), "{from} -> {to}");
        }
    }

    #[test]
    fn allows_noop_transition_even_for_terminal_status() {
        let merged = sale(Status::CommissionIssued);

        assert_eq!(check(Status::CommissionIssued, &merged), Vec::new());
    }

    #[test]
    fn rejects_skipping_statuses() {
        let mut merged = sale(Status::BonusesIssued);
        merged.seller_bonus = Some(Money::from(300_000));
        merged.intake_bonus = Some(Money::from(200_000));
        merged.total_bonuses = Some(Money::from(500_000));

        assert_eq!(
            check(Status::OnApproval, &merged),
            vec![Violation::TransitionNotAllowed {
                from: Status::OnApproval,
                to: Status::BonusesIssued,
            }],
        );
    }

    #[test]
    fn rejects_leaving_terminal_status() {
        let merged = sale(Status::Sold);

        assert_eq!(
            check(Status::CommissionIssued, &merged),
            vec![Violation::TerminalStatus(Status::CommissionIssued)],
        );
    }

    #[test]
    fn requires_sale_date_and_price_for_processing() {
        let mut merged = sale(Status::OnProcessing);
        merged.sale_date = None;
        merged.sale_price = Money::ZERO;

        assert_eq!(
            check(Status::OnApproval, &merged),
            vec![
                Violation::SaleDateRequired(Status::OnProcessing),
                Violation::SalePriceRequired(Status::OnProcessing),
            ],
        );
    }

    #[test]
    fn requires_positive_sale_price_for_sold() {
        let mut merged = sale(Status::Sold);
        merged.sale_price = Money::ZERO;

        assert_eq!(
            check(Status::OnProcessing, &merged),
            vec![Violation::SalePriceNotPositive(Status::Sold)],
        );
    }

    #[test]
    fn requires_bonuses_and_profit_for_bonuses_issued() {
        let mut merged = sale(Status::BonusesIssued);
        merged.sale_price = Money::from(4_000_000);
        merged.net_profit = merged.sale_price - merged.purchase_price;

        assert_eq!(
            check(Status::Sold, &merged),
            vec![
                Violation::SellerBonusRequired(Status::BonusesIssued),
                Violation::IntakeBonusRequired(Status::BonusesIssued),
                Violation::TotalBonusesRequired(Status::BonusesIssued),
                Violation::NetProfitNotPositive(Status::BonusesIssued),
            ],
        );
    }

    #[test]
    fn requires_bonuses_issued_before_commission() {
        let merged = sale(Status::CommissionIssued);

        assert_eq!(
            check(Status::Sold, &merged),
            vec![
                Violation::TransitionNotAllowed {
                    from: Status::Sold,
                    to: Status::CommissionIssued,
                },
                Violation::CommissionBeforeBonuses,
            ],
        );
    }

    #[test]
    fn allows_commission_after_bonuses() {
        let mut merged = sale(Status::CommissionIssued);
        merged.seller_bonus = Some(Money::from(300_000));
        merged.intake_bonus = Some(Money::from(200_000));
        merged.total_bonuses = Some(Money::from(500_000));

        assert_eq!(check(Status::BonusesIssued, &merged), Vec::new());
    }
}
