use approx::assert_relative_eq;
use convertible_fd::core::Decision;
use convertible_fd::engines::fd::{DiffusionModel, FdEngine, Scheme};
use convertible_fd::instruments::{ConvertibleBond, DateSet, Provision};
use convertible_fd::market::Market;

fn reference_bond() -> ConvertibleBond {
    let coupons = DateSet::regular(0.5, 5.0).unwrap();
    ConvertibleBond::new(100.0, 5.0)
        .with_coupons(coupons.clone(), 2.0)
        .with_conversion(coupons, 1.0)
}

fn reference_market(hazard: f64, recovery: f64) -> Market {
    Market::builder()
        .spot(100.0)
        .rate(0.05)
        .flat_vol(0.20)
        .hazard_rate(hazard)
        .recovery(recovery)
        .build()
        .unwrap()
}

fn reference_engine() -> FdEngine {
    FdEngine::new(0.0, 200.0, 200)
}

#[test]
fn axes_are_strictly_increasing_with_requested_cardinality() {
    let bond = reference_bond();
    let solution = reference_engine()
        .solve(&bond, &reference_market(0.02, 1.0))
        .unwrap();

    assert_eq!(solution.s.len(), 201);
    assert!(solution.s.windows(2).all(|w| w[1] > w[0]));
    assert!(solution.t.windows(2).all(|w| w[1] > w[0]));

    assert_eq!(solution.t[0], 0.0);
    assert_eq!(*solution.t.last().unwrap(), 5.0);
    for coupon_date in bond.coupon_dates.as_slice() {
        assert!(
            solution.time_index(*coupon_date).is_some(),
            "coupon date {coupon_date} missing from the time axis"
        );
    }

    assert_eq!(solution.v.len(), solution.t.len());
    assert_eq!(solution.decisions.len(), solution.t.len());
    assert!(solution.v.iter().all(|row| row.len() == solution.s.len()));
}

#[test]
fn terminal_row_is_the_redemption_payoff_for_every_scheme_and_diffusion() {
    let bond = reference_bond();
    let market = reference_market(0.02, 0.5);

    for scheme in [Scheme::CrankNicolson, Scheme::Implicit] {
        for diffusion in [DiffusionModel::Separated, DiffusionModel::HazardAdjusted] {
            let solution = reference_engine()
                .with_scheme(scheme)
                .with_diffusion(diffusion)
                .solve(&bond, &market)
                .unwrap();

            let last = solution.t.len() - 1;
            let redemption = bond.redemption_value();
            for (i, &si) in solution.s.iter().enumerate() {
                assert_eq!(solution.v[last][i], redemption.max(si));
            }
        }
    }
}

#[test]
fn price_is_monotone_in_recovery() {
    let bond = reference_bond();
    // The fully implicit step is a monotone scheme, so the nodewise ordering
    // in the recovery fraction survives discretization exactly.
    let engine = reference_engine().with_scheme(Scheme::Implicit);

    let low = engine.solve(&bond, &reference_market(0.02, 0.0)).unwrap();
    let mid = engine.solve(&bond, &reference_market(0.02, 0.5)).unwrap();
    let high = engine.solve(&bond, &reference_market(0.02, 1.0)).unwrap();

    for i in 0..low.s.len() {
        assert!(
            low.v[0][i] <= mid.v[0][i] + 1.0e-8,
            "R=0 exceeds R=0.5 at S={}",
            low.s[i]
        );
        assert!(
            mid.v[0][i] <= high.v[0][i] + 1.0e-8,
            "R=0.5 exceeds R=1 at S={}",
            mid.s[i]
        );
    }
}

#[test]
fn diffusion_variants_agree_without_default_risk() {
    let bond = reference_bond();
    let market = reference_market(0.0, 0.5);
    let engine = reference_engine();

    let separated = engine
        .with_diffusion(DiffusionModel::Separated)
        .solve(&bond, &market)
        .unwrap();
    let adjusted = reference_engine()
        .with_diffusion(DiffusionModel::HazardAdjusted)
        .solve(&bond, &market)
        .unwrap();

    for (row_s, row_a) in separated.v.iter().zip(&adjusted.v) {
        for (&vs, &va) in row_s.iter().zip(row_a) {
            assert_relative_eq!(vs, va, max_relative = 1.0e-6);
        }
    }
}

#[test]
fn constrained_surface_dominates_every_eligible_feature() {
    let coupons = DateSet::regular(0.5, 5.0).unwrap();
    let bond = ConvertibleBond::new(100.0, 5.0)
        .with_coupons(coupons.clone(), 2.0)
        .with_conversion(coupons, 1.0)
        .with_put(Provision::flat(&DateSet::new(vec![2.0]).unwrap(), 105.0).unwrap())
        .with_call(
            Provision::flat(&DateSet::new(vec![3.0, 3.5, 4.0]).unwrap(), 110.0).unwrap(),
        );
    let market = reference_market(0.02, 0.5);
    let solution = reference_engine().solve(&bond, &market).unwrap();

    for (k, &tk) in solution.t.iter().enumerate() {
        let coupon = if bond.is_coupon_date(tk) && tk < bond.maturity {
            bond.coupon_amount
        } else {
            0.0
        };
        for (i, &si) in solution.s.iter().enumerate() {
            let v = solution.v[k][i];
            if bond.is_conversion_date(tk) {
                assert!(
                    v + 1.0e-8 >= bond.conversion_value(si) + coupon,
                    "conversion floor violated at t={tk} S={si}"
                );
            }
            if let Some(put) = &bond.put
                && put.contains(tk)
            {
                assert!(
                    v + 1.0e-8 >= put.strike(tk).unwrap() + coupon,
                    "put floor violated at t={tk} S={si}"
                );
            }
            if let Some(call) = &bond.call
                && call.contains(tk)
            {
                let cap = call.strike(tk).unwrap().max(bond.conversion_value(si));
                assert!(
                    v <= cap + coupon + 1.0e-8,
                    "call cap violated at t={tk} S={si}"
                );
            }
        }
    }
}

#[test]
fn repeated_solves_are_bit_identical() {
    let bond = reference_bond();
    let market = reference_market(0.02, 0.5);
    let engine = reference_engine();

    let first = engine.solve(&bond, &market).unwrap();
    let second = engine.solve(&bond, &market).unwrap();
    assert_eq!(first, second);
}

#[test]
fn implicit_scheme_stays_close_to_crank_nicolson() {
    let bond = reference_bond();
    let market = reference_market(0.02, 0.5);

    let cn = reference_engine().solve(&bond, &market).unwrap();
    let implicit = reference_engine()
        .with_scheme(Scheme::Implicit)
        .solve(&bond, &market)
        .unwrap();

    let spot_cn = cn.value_at(0, 100.0);
    let spot_implicit = implicit.value_at(0, 100.0);
    assert!(
        (spot_cn - spot_implicit).abs() <= 1.0,
        "schemes diverge: cn={spot_cn} implicit={spot_implicit}"
    );
}

#[test]
fn forced_conversion_appears_where_the_call_is_economically_forced() {
    // Callable at 105 half-way through; a coupon after the call date keeps
    // the continuation value strictly above the conversion value, so deep
    // in the money the call forces conversion.
    let bond = ConvertibleBond::new(100.0, 1.0)
        .with_coupons(DateSet::new(vec![0.75]).unwrap(), 4.0)
        .with_conversion(DateSet::new(vec![0.5, 1.0]).unwrap(), 1.0)
        .with_call(Provision::flat(&DateSet::new(vec![0.5]).unwrap(), 105.0).unwrap());
    let market = reference_market(0.0, 1.0);

    let solution = FdEngine::new(0.0, 400.0, 400)
        .with_time_steps(100)
        .solve(&bond, &market)
        .unwrap();

    let row = solution.time_index(0.5).unwrap();
    let deep_itm = solution.price_index(300.0).unwrap();
    let near_strike = solution.price_index(95.0).unwrap();
    let out_of_money = solution.price_index(50.0).unwrap();

    assert_eq!(
        solution.decisions[row][deep_itm],
        Decision::ForcedConversion
    );
    assert_eq!(solution.decisions[row][near_strike], Decision::Call);
    assert_eq!(solution.decisions[row][out_of_money], Decision::Hold);

    // The forced node is pinned to the conversion value.
    assert_relative_eq!(solution.v[row][deep_itm], 300.0, epsilon = 1.0e-9);
}
