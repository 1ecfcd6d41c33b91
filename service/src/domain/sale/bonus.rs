//! Validation of [`Sale`] bonus invariants.

use common::Money;

use super::{Sale, Violation};

/// Checks the bonus invariants of the provided merged [`Sale`].
///
/// Applies whenever any bonus field is populated, regardless of the current
/// [`Status`](super::Status): the sum of per-role bonuses must match the
/// stated total and must not exceed the net profit.
///
/// Returns every detected [`Violation`]. An empty [`Vec`] means the bonuses
/// are consistent.
#[must_use]
pub fn check(merged: &Sale) -> Vec<Violation> {
    if !merged.has_any_bonus() {
        return Vec::new();
    }

    let computed = merged.bonus_components_total();
    let stated = merged.total_bonuses.unwrap_or(Money::ZERO);

    let mut violations = Vec::new();

    if computed > merged.net_profit {
        violations.push(Violation::BonusesExceedProfit {
            total: computed,
            net_profit: merged.net_profit,
        });
    }
    if computed != stated {
        violations.push(Violation::BonusSumMismatch { stated, computed });
    }

    violations
}

#[cfg(test)]
mod spec {
    use common::{DateTimeOf, Money};

    use super::{check, Violation};
    use crate::domain::{customer, employee, sale, vehicle, Sale};

    fn sale() -> Sale {
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
            status: sale::Status::Sold,
            is_commission_paid: false,
            sale_date: Some(DateTimeOf::now()),
            is_active: true,
            created_at: DateTimeOf::now(),
            updated_at: DateTimeOf::now(),
        }
    }

    #[test]
    fn skips_sale_without_bonuses() {
        assert_eq!(check(&sale()), Vec::new());
    }

    #[test]
    fn accepts_consistent_bonuses() {
        let mut s = sale();
        s.seller_bonus = Some(Money::from(400_000));
        s.intake_bonus = Some(Money::from(300_000));
        s.manager_bonus = Some(Money::from(100_000));
        s.total_bonuses = Some(Money::from(800_000));

        assert_eq!(check(&s), Vec::new());
    }

    #[test]
    fn missing_components_count_as_zero() {
        let mut s = sale();
        s.seller_bonus = Some(Money::from(400_000));
        s.total_bonuses = Some(Money::from(400_000));

        assert_eq!(check(&s), Vec::new());
    }

    #[test]
    fn rejects_total_mismatch() {
        let mut s = sale();
        s.seller_bonus = Some(Money::from(400_000));
        s.intake_bonus = Some(Money::from(300_000));
        s.total_bonuses = Some(Money::from(800_000));

        assert_eq!(
            check(&s),
            vec![Violation::BonusSumMismatch {
                stated: Money::from(800_000),
                computed: Money::from(700_000),
            }],
        );
    }

    #[test]
    fn rejects_bonuses_exceeding_profit() {
        let mut s = sale();
        s.seller_bonus = Some(Money::from(900_000));
        s.intake_bonus = Some(Money::from(300_000));
        s.total_bonuses = Some(Money::from(1_200_000));

        assert_eq!(
            check(&s),
            vec![Violation::BonusesExceedProfit {
                total: Money::from(1_200_000),
                net_profit: Money::from(1_000_000),
            }],
        );
    }

    #[test]
    fn bonuses_may_equal_profit_exactly() {
        let mut s = sale();
        s.seller_bonus = Some(Money::from(600_000));
        s.intake_bonus = Some(Money::from(400_000));
        s.total_bonuses = Some(Money::from(1_000_000));

        assert_eq!(check(&s), Vec::new());
    }

    #[test]
    fn reports_both_violations_at_once() {
        let mut s = sale();
        s.seller_bonus = Some(Money::from(900_000));
        s.intake_bonus = Some(Money::from(300_000));
        s.total_bonuses = Some(Money::from(1_100_000));

        assert_eq!(
            check(&s),
            vec![
                Violation::BonusesExceedProfit {
                    total: Money::from(1_200_000),
                    net_profit: Money::from(1_000_000),
                },
                Violation::BonusSumMismatch {
                    stated: Money::from(1_100_000),
                    computed: Money::from(1_200_000),
                },
            ],
        );
    }
}
