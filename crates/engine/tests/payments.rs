mod common;

use std::sync::Arc;

use rust_decimal_macros::dec;

use common::{Fixture, engine_with_db, engine_with_file_db, money, standard_loan};
use engine::{AllocationSpec, EngineError, LoanStatus, Money, PaymentCmd};

fn pay(fx: &Fixture, loan_id: i64, total: &str, allocations: Vec<AllocationSpec>) -> PaymentCmd {
    PaymentCmd::new(loan_id, fx.alice, money(total), allocations)
}

#[tokio::test]
async fn payment_lowers_split_and_total_debt() {
    let fx = engine_with_db().await;
    let detail = standard_loan(&fx).await;
    let split_a = detail.splits[0].id;
    let debt_before = fx.engine.total_debt(fx.alice).await.unwrap();

    let payment = fx
        .engine
        .make_payment(
            pay(
                &fx,
                detail.loan.id,
                "300.00",
                vec![AllocationSpec::new(split_a, money("250.00"), money("50.00"))],
            )
            .comment("november"),
        )
        .await
        .unwrap();

    assert_eq!(payment.total_amount, money("300.00"));
    assert_eq!(payment.principal_paid(), money("250.00"));
    assert_eq!(payment.interest_paid(), money("50.00"));
    assert_eq!(payment.comment.as_deref(), Some("november"));
    assert_eq!(payment.allocations.len(), 1);

    let after = fx.engine.loan_detail(detail.loan.id).await.unwrap();
    assert_eq!(after.splits[0].remaining_principal, money("350.00"));
    assert_eq!(after.splits[1].remaining_principal, money("400.00"));
    assert_eq!(after.remaining_debt, money("750.00"));
    assert_eq!(after.percent_paid, dec!(0.25));
    assert_eq!(after.payment_history, vec![payment]);

    let debt_after = fx.engine.total_debt(fx.alice).await.unwrap();
    assert_eq!(debt_before - debt_after, money("250.00"));
}

#[tokio::test]
async fn mismatched_allocations_are_rejected_without_writes() {
    let fx = engine_with_db().await;
    let detail = standard_loan(&fx).await;
    let split_a = detail.splits[0].id;

    let err = fx
        .engine
        .make_payment(pay(
            &fx,
            detail.loan.id,
            "300.00",
            vec![AllocationSpec::new(split_a, money("250.00"), money("49.99"))],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AmountMismatch(_)));

    let after = fx.engine.loan_detail(detail.loan.id).await.unwrap();
    assert_eq!(after, detail);
}

#[tokio::test]
async fn over_allocation_is_rejected_without_writes() {
    let fx = engine_with_db().await;
    let detail = standard_loan(&fx).await;
    let split_a = detail.splits[0].id;
    let split_b = detail.splits[1].id;

    let err = fx
        .engine
        .make_payment(pay(
            &fx,
            detail.loan.id,
            "609.99",
            vec![
                AllocationSpec::new(split_b, money("9.98"), Money::ZERO),
                AllocationSpec::new(split_a, money("600.01"), Money::ZERO),
            ],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OverAllocation(_)));

    let after = fx.engine.loan_detail(detail.loan.id).await.unwrap();
    assert_eq!(after.remaining_debt, money("1000.00"));
    assert!(after.payment_history.is_empty());
}

#[tokio::test]
async fn queued_payments_cannot_overdraw_a_split() {
    let fx = engine_with_db().await;
    let detail = standard_loan(&fx).await;
    let split_a = detail.splits[0].id;

    // Each pays 60% of the split; only one can succeed.
    let first = pay(
        &fx,
        detail.loan.id,
        "360.00",
        vec![AllocationSpec::new(split_a, money("360.00"), Money::ZERO)],
    );
    let second = first.clone();

    let (a, b) = tokio::join!(
        fx.engine.make_payment(first),
        fx.engine.make_payment(second)
    );

    let results = [a, b];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let over = results
        .iter()
        .filter(|r| matches!(r, Err(EngineError::OverAllocation(_))))
        .count();
    assert_eq!(succeeded, 1);
    assert_eq!(over, 1);

    let after = fx.engine.loan_detail(detail.loan.id).await.unwrap();
    assert_eq!(after.splits[0].remaining_principal, money("240.00"));
    assert_eq!(after.payment_history.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_payments_on_a_file_database_never_overdraw() {
    let file = engine_with_file_db().await;
    let fx = &file.fixture;

    for _ in 0..10 {
        let detail = standard_loan(fx).await;
        let split_a = detail.splits[0].id;
        let cmd = pay(
            fx,
            detail.loan.id,
            "360.00",
            vec![AllocationSpec::new(split_a, money("360.00"), Money::ZERO)],
        );

        let tasks: Vec<_> = [cmd.clone(), cmd]
            .into_iter()
            .map(|cmd| {
                let engine = Arc::clone(&fx.engine);
                tokio::spawn(async move { engine.make_payment(cmd).await })
            })
            .collect();
        let mut results = Vec::new();
        for task in tasks {
            results.push(task.await.unwrap());
        }

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        // SQLite may also refuse the losing writer as busy; either way it
        // must not have written anything.
        assert!(results.iter().all(|r| matches!(
            r,
            Ok(_) | Err(EngineError::OverAllocation(_)) | Err(EngineError::Database(_))
        )));

        let after = fx.engine.loan_detail(detail.loan.id).await.unwrap();
        assert_eq!(after.splits[0].remaining_principal, money("240.00"));
        assert_eq!(after.payment_history.len(), 1);
    }
}

#[tokio::test]
async fn only_the_borrower_can_pay() {
    let fx = engine_with_db().await;
    let detail = standard_loan(&fx).await;
    let split_a = detail.splits[0].id;

    let err = fx
        .engine
        .make_payment(PaymentCmd::new(
            detail.loan.id,
            fx.bob,
            money("10.00"),
            vec![AllocationSpec::new(split_a, money("10.00"), Money::ZERO)],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = fx
        .engine
        .payments(detail.loan.id, fx.bob)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn split_of_another_loan_is_not_found() {
    let fx = engine_with_db().await;
    let first = standard_loan(&fx).await;
    let second = standard_loan(&fx).await;

    let err = fx
        .engine
        .make_payment(pay(
            &fx,
            first.loan.id,
            "10.00",
            vec![AllocationSpec::new(
                second.splits[0].id,
                money("10.00"),
                Money::ZERO,
            )],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn retry_with_same_key_returns_original_payment() {
    let fx = engine_with_db().await;
    let detail = standard_loan(&fx).await;
    let split_a = detail.splits[0].id;
    let cmd = pay(
        &fx,
        detail.loan.id,
        "100.00",
        vec![AllocationSpec::new(split_a, money("100.00"), Money::ZERO)],
    )
    .idempotency_key("pay-1");

    let first = fx.engine.make_payment(cmd.clone()).await.unwrap();
    let second = fx.engine.make_payment(cmd).await.unwrap();
    assert_eq!(first, second);

    let after = fx.engine.loan_detail(detail.loan.id).await.unwrap();
    assert_eq!(after.splits[0].remaining_principal, money("500.00"));
    assert_eq!(after.payment_history.len(), 1);
}

#[tokio::test]
async fn full_repayment_marks_loan_paid() {
    let fx = engine_with_db().await;
    let detail = standard_loan(&fx).await;

    fx.engine
        .make_payment(pay(
            &fx,
            detail.loan.id,
            "1010.00",
            vec![
                AllocationSpec::new(detail.splits[0].id, money("600.00"), money("6.00")),
                AllocationSpec::new(detail.splits[1].id, money("400.00"), money("4.00")),
            ],
        ))
        .await
        .unwrap();

    let after = fx.engine.loan_detail(detail.loan.id).await.unwrap();
    assert_eq!(after.loan.status, LoanStatus::Paid);
    assert_eq!(after.remaining_debt, Money::ZERO);
    assert_eq!(after.percent_paid, dec!(1));
    assert_eq!(fx.engine.total_debt(fx.alice).await.unwrap(), Money::ZERO);

    let err = fx
        .engine
        .make_payment(pay(
            &fx,
            detail.loan.id,
            "1.00",
            vec![AllocationSpec::new(detail.splits[0].id, Money::ZERO, money("1.00"))],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidLoanState(_)));
}

#[tokio::test]
async fn principal_is_conserved_across_payments() {
    let fx = engine_with_db().await;
    let detail = standard_loan(&fx).await;
    let split_a = detail.splits[0].id;
    let split_b = detail.splits[1].id;

    for (a, b) in [("100.00", "50.00"), ("0.01", "0.00"), ("199.99", "349.99")] {
        let mut allocations = vec![AllocationSpec::new(split_a, money(a), Money::ZERO)];
        if money(b).is_positive() {
            allocations.push(AllocationSpec::new(split_b, money(b), Money::ZERO));
        }
        let total = money(a) + money(b);
        fx.engine
            .make_payment(PaymentCmd::new(detail.loan.id, fx.alice, total, allocations))
            .await
            .unwrap();
    }

    let after = fx.engine.loan_detail(detail.loan.id).await.unwrap();
    let paid: Money = after
        .payment_history
        .iter()
        .map(|p| p.principal_paid())
        .sum();
    assert_eq!(after.remaining_debt + paid, detail.loan.original_amount);
    for split in &after.splits {
        assert!(split.remaining_principal >= Money::ZERO);
        assert!(split.remaining_principal <= split.split_amount);
    }
}

#[tokio::test]
async fn planned_allocations_can_be_paid_as_is() {
    let fx = engine_with_db().await;
    let detail = fx
        .engine
        .create_loan(
            engine::NewLoanCmd::new(
                fx.alice,
                money("1000.00"),
                vec![
                    engine::SplitSpec::new(common::BANK_A, money("600.00")),
                    engine::SplitSpec::new(common::BANK_B, money("400.00")),
                ],
            )
            .interest_rate("12.00".parse().unwrap()),
        )
        .await
        .unwrap();

    let plan = fx
        .engine
        .plan_payment(detail.loan.id, fx.alice, money("100.00"))
        .await
        .unwrap();
    assert_eq!(
        plan,
        vec![
            AllocationSpec::new(detail.splits[0].id, money("54.00"), money("6.00")),
            AllocationSpec::new(detail.splits[1].id, money("36.00"), money("4.00")),
        ]
    );

    fx.engine
        .make_payment(PaymentCmd::new(
            detail.loan.id,
            fx.alice,
            money("100.00"),
            plan,
        ))
        .await
        .unwrap();
    assert_eq!(
        fx.engine.total_debt(fx.alice).await.unwrap(),
        money("910.00")
    );
}

#[tokio::test]
async fn allocations_are_visible_to_the_borrower_only() {
    let fx = engine_with_db().await;
    let detail = standard_loan(&fx).await;
    let payment = fx
        .engine
        .make_payment(pay(
            &fx,
            detail.loan.id,
            "20.00",
            vec![
                AllocationSpec::new(detail.splits[0].id, money("10.00"), Money::ZERO),
                AllocationSpec::new(detail.splits[1].id, money("10.00"), Money::ZERO),
            ],
        ))
        .await
        .unwrap();

    let allocations = fx
        .engine
        .payment_allocations(payment.id, fx.alice)
        .await
        .unwrap();
    assert_eq!(allocations, payment.allocations);

    let err = fx
        .engine
        .payment_allocations(payment.id, fx.bob)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = fx
        .engine
        .payment_allocations(404, fx.alice)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}
