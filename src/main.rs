use std::io::Write;

use crossterm::{cursor, queue, terminal};
use mazeflow::{Config, MazeSession, Solver, Status};

/// Log to a file so tracing output never lands in the middle of the drawing.
fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(".", "mazeflow.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let level = std::env::var("MAZE_LOG")
        .ok()
        .and_then(|l| l.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_max_level(level)
        .init();
    guard
}

fn draw(session: &MazeSession) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    queue!(
        stdout,
        terminal::Clear(terminal::ClearType::All),
        cursor::MoveTo(0, 0),
    )?;
    if let Some(maze) = session.maze() {
        write!(stdout, "{}", maze.borrow())?;
    }
    writeln!(stdout, "{:?}", session.status())?;
    stdout.flush()
}

fn main() -> std::io::Result<()> {
    let _guard = init_logging();
    let config = Config::from_env();

    let mut input = String::new();
    println!(
        "Enter maze dimensions (rows cols), or press Enter for {}x{}:",
        config.rows, config.cols
    );
    std::io::stdin().read_line(&mut input)?;
    let dims = input
        .split_whitespace()
        .take(2)
        .filter_map(|s| s.parse::<usize>().ok())
        .collect::<Vec<_>>();
    let (rows, cols) = match dims.as_slice() {
        [] => (config.rows, config.cols),
        [rows, cols] => (*rows, *cols),
        _ => {
            eprintln!("Please enter two valid numbers for rows and columns.");
            return Ok(());
        }
    };

    println!("Select maze solving algorithm:");
    for (i, solver) in Solver::ALL.iter().enumerate() {
        println!("{}. {} ({})", i + 1, solver, solver.name());
    }
    input.clear();
    std::io::stdin().read_line(&mut input)?;
    let choice = input.trim();
    let solver = match choice.parse::<usize>() {
        Ok(n) if (1..=Solver::ALL.len()).contains(&n) => Solver::ALL[n - 1],
        _ => match choice.parse::<Solver>() {
            Ok(solver) => solver,
            Err(e) => {
                eprintln!("{e}");
                return Ok(());
            }
        },
    };

    let mut session = MazeSession::new(config.with_size(rows, cols));
    if let Err(e) = session.generate(rows, cols) {
        eprintln!("{e}");
        return Ok(());
    }
    if let Err(e) = session.solve(solver) {
        eprintln!("{e}");
        return Ok(());
    }

    while session.tick() {
        draw(&session)?;
    }
    draw(&session)?;

    match session.status() {
        Status::Solved { visited } => println!("Maze solved! Visited {visited} cells."),
        Status::Failed(e) => println!("Solving failed: {e}"),
        status => println!("Stopped: {status:?}"),
    }
    Ok(())
}
