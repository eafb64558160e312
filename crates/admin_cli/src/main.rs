use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, EngineError, Money, Rate, SplitSpec};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "easyfund_admin")]
#[command(about = "Admin utilities for EasyFund (users, banks, application decisions)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./easyfund.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Bank(Bank),
    Application(Application),
    Loan(Loan),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    phone: Option<String>,
}

#[derive(Args, Debug)]
struct Bank {
    #[command(subcommand)]
    command: BankCommand,
}

#[derive(Subcommand, Debug)]
enum BankCommand {
    Create(BankCreateArgs),
    List,
}

#[derive(Args, Debug)]
struct BankCreateArgs {
    #[arg(long)]
    id: i16,
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct Application {
    #[command(subcommand)]
    command: ApplicationCommand,
}

#[derive(Subcommand, Debug)]
enum ApplicationCommand {
    /// Approve a pending application, creating its loan.
    Approve(ApproveArgs),
    Reject(RejectArgs),
}

#[derive(Args, Debug)]
struct ApproveArgs {
    #[arg(long)]
    id: i64,
    /// Bank share as `bank_id:amount`, repeated once per bank (e.g. `1:600.00`).
    #[arg(long = "split", value_parser = parse_split, required = true)]
    splits: Vec<SplitSpec>,
    /// Yearly interest rate in percent.
    #[arg(long, default_value = "0.00")]
    rate: String,
}

#[derive(Args, Debug)]
struct RejectArgs {
    #[arg(long)]
    id: i64,
}

#[derive(Args, Debug)]
struct Loan {
    #[command(subcommand)]
    command: LoanCommand,
}

#[derive(Subcommand, Debug)]
enum LoanCommand {
    /// Mark an active loan as defaulted.
    Default(LoanDefaultArgs),
}

#[derive(Args, Debug)]
struct LoanDefaultArgs {
    #[arg(long)]
    id: i64,
}

fn parse_split(raw: &str) -> Result<SplitSpec, String> {
    let (bank, amount) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected bank_id:amount, got {raw}"))?;
    let bank_id: i16 = bank
        .trim()
        .parse()
        .map_err(|_| format!("invalid bank id: {bank}"))?;
    let amount: Money = amount.parse().map_err(|err: EngineError| err.to_string())?;
    Ok(SplitSpec::new(bank_id, amount))
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;
            match engine
                .new_user(&args.email, &args.name, args.phone.as_deref(), &password)
                .await
            {
                Ok(user_id) => println!("created user: {} ({user_id})", args.email),
                Err(EngineError::ExistingKey(_)) => {
                    eprintln!("user already exists: {}", args.email);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Bank(Bank {
            command: BankCommand::Create(args),
        }) => {
            let bank = engine.new_bank(args.id, &args.name).await?;
            println!("created bank: {} ({})", bank.name, bank.id);
        }
        Command::Bank(Bank {
            command: BankCommand::List,
        }) => {
            for bank in engine.banks().await? {
                println!("{}\t{}", bank.id, bank.name);
            }
        }
        Command::Application(Application {
            command: ApplicationCommand::Approve(args),
        }) => {
            let rate: Rate = match args.rate.parse() {
                Ok(rate) => rate,
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(2);
                }
            };
            let loan_id = engine
                .approve_application(args.id, &args.splits, rate)
                .await?;
            println!("approved application {}: loan {loan_id}", args.id);
        }
        Command::Application(Application {
            command: ApplicationCommand::Reject(args),
        }) => {
            engine.reject_application(args.id).await?;
            println!("rejected application {}", args.id);
        }
        Command::Loan(Loan {
            command: LoanCommand::Default(args),
        }) => {
            let loan = engine.mark_defaulted(args.id).await?;
            println!("loan {} is now {}", loan.id, loan.status.as_str());
        }
    }

    Ok(())
}
