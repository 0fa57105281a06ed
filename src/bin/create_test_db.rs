use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use tuckshop_rs::{
    ClassCodes, PaymentMethod, PurchasePolicy, StockItemForm, Transaction, TransactionKind,
    apply_purchase, apply_transaction, create_stock_item, initialize_db, register_student,
};

/// A utility for creating a test database for the REST API server of
/// tuckshop_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Registering test students...");

    let class_codes = ClassCodes::default();
    let students = [
        ("Asha Rao", "S1001", "S1"),
        ("Benoy Das", "S1002", "S1"),
        ("Charu Menon", "S2001", "S2"),
        ("Dev Pillai", "D1001", "D1"),
        ("Esha Nair", "D3001", "D3"),
    ];

    let mut student_ids = Vec::new();
    for (name, admission_no, class_code) in students {
        let student = register_student(name, admission_no, class_code, &class_codes, &conn)?;
        student_ids.push(student.id);
    }

    println!("Stocking the shelves...");

    let items = [
        ("Biscuits", 40, 50.0, 80.0),
        ("Fruit Juice", 24, 25.0, 40.0),
        ("Samosa", 30, 8.0, 15.0),
        ("Notebook", 12, 30.0, 45.0),
    ];

    let mut item_ids = Vec::new();
    for (item_name, quantity, cost_price, selling_price) in items {
        let item = create_stock_item(
            &StockItemForm {
                item_name: item_name.to_owned(),
                quantity,
                cost_price,
                selling_price,
            },
            &conn,
        )?;
        item_ids.push(item.id);
    }

    println!("Recording ledger history...");

    for (index, &student_id) in student_ids.iter().enumerate() {
        let deposit = 100.0 * (index + 1) as f64;
        apply_transaction(
            Transaction::build(student_id, TransactionKind::Deposit, deposit, PaymentMethod::Cash)
                .note("opening deposit"),
            &conn,
        )?;
    }

    apply_transaction(
        Transaction::build(student_ids[0], TransactionKind::Expense, 35.0, PaymentMethod::Credit)
            .note("lost library card fee"),
        &conn,
    )?;

    for (&student_id, &item_id) in student_ids.iter().zip(item_ids.iter().cycle()) {
        apply_purchase(student_id, item_id, 2, PurchasePolicy::default(), &conn)?;
    }

    println!("Success!");

    Ok(())
}
