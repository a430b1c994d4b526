//! Reader lifecycle tests.
//!
//! These drive `ObjectReader` and `CachedDataReader` the way code under
//! test consumes a live data reader: through the `DataReader` trait only.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sql_testkit::{
    CachedDataReader, ColumnDefinition, DataReader, DataRecord, Error, ErrorKind, ObjectReader,
    ObjectSet, ReaderState, RecordSetDefinition, SqlError, SqlException, SqlType, SqlValue,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn orders() -> ObjectSet {
    let definition = RecordSetDefinition::new([
        ColumnDefinition::new("OrderId", SqlType::Int).not_null(),
        ColumnDefinition::new(
            "Total",
            SqlType::Decimal {
                precision: 10,
                scale: 2,
            },
        ),
        ColumnDefinition::new("PlacedOn", SqlType::Date),
    ])
    .unwrap();

    let mut set = ObjectSet::new(definition).with_records_affected(2);
    set.add_values(vec![
        SqlValue::Int(100),
        SqlValue::Decimal(Decimal::new(2550, 2)),
        SqlValue::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
    ])
    .unwrap();
    set.add_values(vec![SqlValue::Int(101), SqlValue::Null, SqlValue::Null])
        .unwrap();
    set
}

fn totals() -> ObjectSet {
    let definition = RecordSetDefinition::from_declarations(&[("Count", "BIGINT")]).unwrap();
    let mut set = ObjectSet::new(definition);
    set.add_values(vec![SqlValue::Int(2)]).unwrap();
    set
}

/// Consumer code written against the trait, as an application would.
fn sum_order_totals(reader: &mut dyn DataReader) -> sql_testkit::Result<Decimal> {
    let total = reader.ordinal("total")?;
    let mut sum = Decimal::ZERO;
    while reader.read()? {
        if !reader.is_null(total)? {
            sum += reader.get_decimal(total)?;
        }
    }
    Ok(sum)
}

#[test]
fn test_consumer_over_object_reader() {
    init_tracing();
    let mut reader = ObjectReader::from_sets([orders(), totals()]);

    assert_eq!(sum_order_totals(&mut reader).unwrap(), Decimal::new(2550, 2));
    assert_eq!(reader.records_affected(), 2);

    assert!(reader.next_result().unwrap());
    assert!(reader.read().unwrap());
    // BIGINT widened the INT on write.
    assert_eq!(reader.get_i64(0).unwrap(), 2);
    assert!(matches!(reader.get_i32(0), Err(Error::InvalidCast { .. })));
    assert!(!reader.next_result().unwrap());
}

#[test]
fn test_consumer_over_cached_reader() {
    init_tracing();
    let mut cached =
        CachedDataReader::from_reader(&mut ObjectReader::from_sets([orders(), totals()]))
            .unwrap();

    assert_eq!(sum_order_totals(&mut cached).unwrap(), Decimal::new(2550, 2));
    assert!(cached.next_result().unwrap());
    assert!(cached.read().unwrap());
    assert_eq!(cached.get_i64(0).unwrap(), 2);

    cached.close();
    assert!(cached.is_closed());
    assert_eq!(cached.read().unwrap_err().kind(), ErrorKind::InvalidOperation);

    cached.reset();
    assert_eq!(sum_order_totals(&mut cached).unwrap(), Decimal::new(2550, 2));
}

#[test]
fn test_null_and_typed_access() {
    let mut reader = ObjectReader::from_sets([orders()]);
    assert!(reader.read().unwrap());
    assert!(reader.read().unwrap());

    assert!(reader.is_null(1).unwrap());
    let err = reader.get_decimal(1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NullValue);
    assert_eq!(
        reader.get_by_name::<Option<NaiveDate>>("placedon").unwrap(),
        None
    );

    let mut values = vec![SqlValue::Bool(false); 2];
    assert_eq!(reader.values(&mut values).unwrap(), 2);
    assert_eq!(values, [SqlValue::Int(101), SqlValue::Null]);
}

#[test]
fn test_full_lifecycle() {
    let mut reader = ObjectReader::new();
    reader.add(orders()).unwrap();
    reader.add(totals()).unwrap();
    assert_eq!(reader.state(), ReaderState::Building);

    assert!(reader.read().unwrap());
    assert_eq!(reader.state(), ReaderState::Reading);
    assert_eq!(reader.add(totals()).unwrap_err().kind(), ErrorKind::InvalidOperation);

    reader.close();
    assert_eq!(reader.state(), ReaderState::Closed);
    assert!(matches!(reader.next_result(), Err(Error::ReaderClosed)));
    assert!(matches!(reader.name(0), Err(Error::ReaderClosed)));

    reader.reset();
    assert_eq!(reader.state(), ReaderState::Building);
    reader.remove(1).unwrap();
    assert!(reader.read().unwrap());
    assert_eq!(reader.get_i32(0).unwrap(), 100);
    assert!(!reader.next_result().unwrap());
}

#[test]
fn test_procedure_failing_mid_stream() {
    let failure = SqlException::new(SqlError::unique_key_violation("UQ_Order", "dbo.Orders"));
    let definition = RecordSetDefinition::from_declarations(&[("Id", "INT")]).unwrap();
    let failing = ObjectSet::new(definition).with_error(failure.clone());

    let mut reader = ObjectReader::from_sets([orders(), failing]);
    while reader.read().unwrap() {}

    match reader.next_result() {
        Err(Error::Sql(exception)) => {
            assert_eq!(exception, failure);
            assert_eq!(exception.number(), 2627);
            assert_eq!(exception.class(), 14);
        }
        other => panic!("expected a server error, got {other:?}"),
    }
}

#[test]
fn test_read_all_with_manual_mapping() {
    struct Order {
        id: i32,
        total: Option<Decimal>,
    }

    impl sql_testkit::FromRecord for Order {
        fn from_record<R: DataRecord + ?Sized>(record: &R) -> sql_testkit::Result<Self> {
            Ok(Self {
                id: sql_testkit::data_record::field_by_name(record, "OrderId")?,
                total: sql_testkit::data_record::field_by_name(record, "Total")?,
            })
        }
    }

    let mut reader = ObjectReader::from_sets([orders()]);
    let orders: Vec<Order> = reader.read_all().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, 100);
    assert_eq!(orders[1].total, None);
}
