/// delinquent borrower - skip weeks, get flagged, catch up in one payment
use chrono::{Duration, TimeZone, Utc};
use loan_billing_rs::{
    BillingConfig, BillingError, BillingService, Borrower, InMemoryLoanStore, InstallmentState,
    JsonView, Money, SafeTimeProvider, TimeSource,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "loan_billing_rs=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let mut store = InMemoryLoanStore::new();
    let borrower = store.register_borrower(Borrower::new(
        "Sari",
        "Wulandari",
        "sari@example.com",
        "+62 811 0000 002",
        time.now(),
    ));

    let mut service = BillingService::new(store, BillingConfig::weekly_flat(), &time)?;
    let loan = service.create_loan(borrower, Money::from_major(5_000_000))?;

    // two on-time payments
    for _ in 0..2 {
        controller.advance(Duration::days(7));
        service.make_payment(loan.id, loan.installment_amount)?;
    }

    // then three weeks of silence
    controller.advance(Duration::days(21) + Duration::hours(2));
    println!("{}", service.get_delinquency(loan.id)?.to_json_pretty()?);

    let schedule = service.get_schedule(loan.id)?;
    println!(
        "paid {}, missed {}, pending {}",
        schedule.count(InstallmentState::Paid),
        schedule.count(InstallmentState::Missed),
        schedule.count(InstallmentState::Pending),
    );

    // a single installment is no longer enough
    match service.make_payment(loan.id, loan.installment_amount) {
        Err(err @ BillingError::AmountMismatch { .. }) => println!("rejected: {}", err),
        other => println!("unexpected: {:?}", other),
    }

    let receipt = service.make_payment(loan.id, loan.installment_amount.times(3))?;
    println!("{}", receipt.to_json_pretty()?);
    println!("{}", service.get_delinquency(loan.id)?.to_json_pretty()?);

    for event in service.events() {
        println!("{}", serde_json::to_string(event)?);
    }

    Ok(())
}
