use std::sync::mpsc;

use mazeflow::{Config, MazeSession, Solver};

/// Profiling mode: generate and solve repeatedly without delays or drawing.
/// Grid events are drained on a separate thread, the way a renderer would.
fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let mut args = std::env::args();
    args.next(); // Skip executable name
    let num_iters = args.next().and_then(|s| s.parse::<usize>().ok()).unwrap_or(1);
    let size = args.next().and_then(|s| s.parse::<usize>().ok()).unwrap_or(100);

    let (grid_event_tx, grid_event_rx) = mpsc::channel();
    let render_thread_handle = std::thread::spawn(move || grid_event_rx.iter().count());

    let config = Config::from_env().instant();
    let mut session = MazeSession::new(config).with_events(grid_event_tx);
    for i in 0..num_iters {
        let solver = Solver::ALL[i % Solver::ALL.len()];
        if let Err(e) = session.generate(size, size) {
            eprintln!("{e}");
            break;
        }
        if let Ok(Some(handle)) = session.solve(solver) {
            let outcome = session.block_on(&handle);
            println!("{}: {:?} after visiting {} cells", solver, outcome, session.visited_count());
        }
    }

    // Dropping the session closes the event channel
    drop(session);
    let events = render_thread_handle.join().expect("Render thread panicked");
    println!("{events} grid events streamed");
    Ok(())
}
