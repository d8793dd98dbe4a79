use std::io::Write;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use task_interview::cli::{Command, CommandParser, HELP, parse_task_choice, resolve_choice};
use task_interview::config::{self, AppConfig};
use task_interview::error::SessionError;
use task_interview::interview::{Profile, QuestionKind, Role, Task};
use task_interview::llm::create_client_with_timeout;
use task_interview::session::{
    Phase, SessionEvent, SessionHandle, SessionOrchestrator, Transition,
};

type Input = Lines<BufReader<Stdin>>;

/// What the REPL loop should do after handling a line.
enum Flow {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_env();

    // Logs go to stderr so the conversation on stdout stays readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;
    let client = create_client_with_timeout(&config.llm, config.completion_timeout)
        .context("creating completion client")?;

    eprintln!("📋 Task Interview v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {} ({})", config.llm.backend, config.llm.model);
    if let Some(timeout) = config.completion_timeout {
        eprintln!("   Timeout: {}s", timeout.as_secs());
    }
    eprintln!("   Type /help for commands.\n");

    let session = SessionHandle::new(SessionOrchestrator::new(client));
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let status = session.status().await;
        let flow = match status.phase {
            Phase::AwaitingProfile => collect_profile(&session, &mut input).await?,
            Phase::AwaitingTask | Phase::AwaitingQuestions => {
                choose_task(&session, &mut input).await?
            }
            Phase::Questioning => ask_question(&session, &mut input).await?,
            Phase::AwaitingAnalysis => run_analysis(&session, &mut input).await?,
            Phase::FollowUp | Phase::Concluded => follow_up(&session, &mut input).await?,
        };
        if let Flow::Quit = flow {
            break;
        }
    }

    let status = session.status().await;
    eprintln!("Completion calls this session: {}", status.call_count);
    Ok(())
}

/// Print a prompt and read one line. `None` on EOF.
async fn prompt(input: &mut Input, label: &str) -> anyhow::Result<Option<String>> {
    print!("{label}");
    std::io::stdout().flush()?;
    Ok(input.next_line().await?)
}

/// Read a line and run it through the command parser. EOF means quit.
async fn read_command(input: &mut Input, label: &str) -> anyhow::Result<Command> {
    Ok(match prompt(input, label).await? {
        Some(line) => CommandParser::parse(&line),
        None => Command::Quit,
    })
}

/// Handle commands valid at any prompt. Returns `None` for plain input.
async fn handle_command(
    session: &SessionHandle,
    command: Command,
) -> anyhow::Result<Option<Flow>> {
    let flow = match command {
        Command::Input(_) => return Ok(None),
        Command::Quit => Flow::Quit,
        Command::Help => {
            println!("{HELP}");
            Flow::Continue
        }
        Command::Status => {
            let status = session.status().await;
            println!(
                "Phase: {} | {} | follow-ups {}/{} | calls {}",
                status.phase,
                status.step_label(),
                status.follow_ups_used,
                status.max_follow_ups,
                status.call_count
            );
            if let Some(task) = status.task {
                println!("Task: {task}");
            }
            if let Some(error) = status.last_error {
                println!("Last error: {error}");
            }
            Flow::Continue
        }
        Command::Reset => {
            report(session.dispatch(SessionEvent::Reset).await);
            Flow::Continue
        }
        Command::ChangeTask | Command::ChangeProfile => {
            println!("Not available here.");
            Flow::Continue
        }
        Command::Export(path) => {
            match session.save_transcript(&path).await {
                Ok(turns) => println!("Saved {turns} turns to {}", path.display()),
                Err(e) => println!("Export failed: {e}"),
            }
            Flow::Continue
        }
        Command::Rate { turn_index, rating } => {
            report(
                session
                    .dispatch(SessionEvent::RatingSubmitted { turn_index, rating })
                    .await,
            );
            Flow::Continue
        }
        Command::Invalid(message) => {
            println!("{message}");
            Flow::Continue
        }
    };
    Ok(Some(flow))
}

fn report(result: Result<Transition, SessionError>) {
    match result {
        Ok(Transition::RatingRecorded { turn_index, rating }) => {
            println!("Rating for turn {turn_index}: {rating} / 5")
        }
        Ok(Transition::RatingKept {
            turn_index,
            existing,
        }) => println!("Turn {turn_index} was already rated {existing} / 5"),
        Ok(Transition::Cleared) => println!("History cleared."),
        Ok(Transition::ProfileUnchanged) => println!("Profile unchanged."),
        Ok(Transition::TaskUnchanged) => println!("That task is already active."),
        Ok(_) => {}
        Err(e) => println!("⚠ {e}"),
    }
}

fn print_tasks() {
    for (i, task) in Task::ALL.iter().enumerate() {
        println!("  {}. {}", i + 1, task);
    }
}

async fn collect_profile(session: &SessionHandle, input: &mut Input) -> anyhow::Result<Flow> {
    println!("Company information");
    let mut fields = Vec::with_capacity(4);
    for label in ["Company name: ", "Industry: ", "Size (e.g. employees): ", "Description: "] {
        match read_command(input, label).await? {
            Command::Input(value) => fields.push(value),
            command => {
                if let Some(flow) = handle_command(session, command).await? {
                    return Ok(flow);
                }
            }
        }
    }
    let [name, industry, size, description]: [String; 4] = fields
        .try_into()
        .map_err(|_| anyhow::anyhow!("profile form incomplete"))?;

    match session
        .dispatch(SessionEvent::ProfileSubmitted(Profile::new(
            name,
            industry,
            size,
            description,
        )))
        .await
    {
        Ok(Transition::ProfileCommitted) => println!("Company information saved!\n"),
        other => report(other),
    }
    Ok(Flow::Continue)
}

async fn choose_task(session: &SessionHandle, input: &mut Input) -> anyhow::Result<Flow> {
    println!("Choose a task:");
    print_tasks();
    let choice = match read_command(input, "Task: ").await? {
        Command::Input(choice) => choice,
        Command::ChangeProfile => return collect_profile(session, input).await,
        command => return Ok(handle_command(session, command).await?.unwrap_or(Flow::Continue)),
    };

    let task = match parse_task_choice(&choice) {
        Ok(task) => task,
        Err(e) => {
            println!("⚠ {e}");
            return Ok(Flow::Continue);
        }
    };

    println!("Preparing questions...");
    match session.dispatch(SessionEvent::TaskSelected(task)).await {
        Ok(Transition::QuestionsReady { count, .. }) => {
            println!("\nTask: {task} ({count} questions)\n")
        }
        other => report(other),
    }
    Ok(Flow::Continue)
}

async fn ask_question(session: &SessionHandle, input: &mut Input) -> anyhow::Result<Flow> {
    let status = session.status().await;
    let question = session
        .with_state(|state| {
            state
                .current_question()
                .map(|q| (q.text().to_string(), q.kind(), q.options().to_vec()))
        })
        .await;
    let Some((text, kind, options)) = question else {
        return Ok(Flow::Continue);
    };

    println!("🤖 {text}  [{}]", status.step_label());
    for (i, option) in options.iter().enumerate() {
        println!("   {}. {}", i + 1, option);
    }
    let label = if kind == QuestionKind::Input { "> " } else { "Choose an option: " };

    let answer = match read_command(input, label).await? {
        Command::Input(answer) => resolve_choice(&answer, &options),
        Command::ChangeTask => return choose_task(session, input).await,
        Command::ChangeProfile => return collect_profile(session, input).await,
        command => return Ok(handle_command(session, command).await?.unwrap_or(Flow::Continue)),
    };
    if let Err(e) = session.dispatch(SessionEvent::AnswerSubmitted(answer)).await {
        println!("⚠ {e}");
    }
    Ok(Flow::Continue)
}

async fn run_analysis(session: &SessionHandle, input: &mut Input) -> anyhow::Result<Flow> {
    println!("Generating detailed analysis...");
    match session.dispatch(SessionEvent::AnalysisRequested).await {
        Ok(Transition::AnalysisReady) => {
            let last = session
                .with_state(|state| {
                    let turns = state.conversation();
                    turns
                        .last()
                        .map(|t| (turns.len() - 1, t.content.clone()))
                })
                .await;
            if let Some((index, analysis)) = last {
                println!("\n## Analysis Results\n\n{analysis}\n");
                println!("(rate it with /rate {index} <1-5>; ask follow-ups below)\n");
            }
            Ok(Flow::Continue)
        }
        Ok(Transition::AnalysisFailed { error }) => {
            println!("⚠ {error}");
            match read_command(input, "Press Enter to retry, or a command: ").await? {
                Command::Input(_) => Ok(Flow::Continue),
                Command::ChangeTask => choose_task(session, input).await,
                Command::ChangeProfile => collect_profile(session, input).await,
                command => Ok(handle_command(session, command).await?.unwrap_or(Flow::Continue)),
            }
        }
        other => {
            report(other);
            Ok(Flow::Continue)
        }
    }
}

async fn follow_up(session: &SessionHandle, input: &mut Input) -> anyhow::Result<Flow> {
    let status = session.status().await;
    let label = if status.phase.is_terminal() {
        println!("Follow-up limit reached. Use /task, /profile, /export or /quit.");
        "> ".to_string()
    } else {
        format!(
            "Follow-up ({}/{}) > ",
            status.follow_ups_used + 1,
            status.max_follow_ups
        )
    };

    let text = match read_command(input, &label).await? {
        Command::Input(text) if text.is_empty() => return Ok(Flow::Continue),
        Command::Input(text) => text,
        Command::ChangeTask => return choose_task(session, input).await,
        Command::ChangeProfile => return collect_profile(session, input).await,
        command => return Ok(handle_command(session, command).await?.unwrap_or(Flow::Continue)),
    };

    println!("Processing follow-up...");
    match session.dispatch(SessionEvent::FollowUpSubmitted(text)).await {
        Ok(Transition::FollowUpAnswered { .. }) => {
            let reply = session
                .with_state(|state| {
                    let turns = state.conversation();
                    turns
                        .iter()
                        .rposition(|t| t.role == Role::Assistant)
                        .map(|i| (i, turns[i].content.clone()))
                })
                .await;
            if let Some((index, content)) = reply {
                println!("\n🤖 {content}\n   (turn {index})\n");
            }
        }
        other => report(other),
    }
    Ok(Flow::Continue)
}
