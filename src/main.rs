//! EduConnect CLI - Lightweight campus network client
//!
//! A terminal client for the EduConnect hosted backend: role-based
//! registration, courses and enrollment, chat rooms, and the peer-help
//! board.

mod api;
mod auth;
mod backend;
mod config;
mod models;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth::{AuthApi, AuthService, SessionBridge, SessionStore};
use backend::{Backend, BackendClient};
use config::Config;
use models::{
    HelpPriority, HelpStatus, MessageType, NewChatRoom, NewCourse, NewHelpRequest,
    NewHelpResponse, NewMessage, NewStudent, NewTeacher, NewUser, Role, RoomType, User,
    UserUpdate,
};

#[derive(Parser)]
#[command(name = "educonnect")]
#[command(about = "Lightweight CLI client for the EduConnect campus network", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Record the backend endpoint and project key
    Configure {
        /// Backend project URL
        #[arg(long)]
        url: String,

        /// Project (anon) key
        #[arg(long)]
        key: String,
    },

    /// Create an account and its campus profile
    Register {
        email: String,

        #[arg(long)]
        password: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Account role: student or teacher
        #[arg(long)]
        role: String,

        /// Student number (students only)
        #[arg(long)]
        student_id: Option<String>,

        /// Current semester (students only)
        #[arg(long)]
        semester: Option<i32>,

        /// Specialty, e.g. CS (students only)
        #[arg(long)]
        specialty: Option<String>,

        /// Enrollment year (students only)
        #[arg(long)]
        enrollment_year: Option<i32>,

        /// Staff number (teachers only)
        #[arg(long)]
        teacher_id: Option<String>,

        /// Department (teachers only)
        #[arg(long)]
        department: Option<String>,

        /// Taught specialties, repeatable (teachers only)
        #[arg(long = "teaches")]
        specialties: Vec<String>,
    },

    /// Sign in with email and password
    Login {
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Sign out and clear the stored session
    Logout,

    /// Show configuration and session status
    Status,

    /// Show the signed-in user's profile
    Whoami,

    /// Update the signed-in user's profile
    Profile {
        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New avatar URL
        #[arg(long)]
        avatar: Option<String>,
    },

    /// List courses for a specialty/semester, or a teacher's own
    Courses {
        #[arg(long)]
        specialty: Option<String>,

        #[arg(long)]
        semester: Option<i32>,

        /// List courses owned by this teacher instead
        #[arg(long)]
        teacher: Option<String>,
    },

    /// Create a course (teachers)
    CourseNew {
        name: String,

        #[arg(long)]
        code: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long)]
        semester: i32,

        #[arg(long)]
        specialty: String,
    },

    /// Enroll in a course (students)
    Enroll {
        course_id: String,
    },

    /// List chat rooms visible to the signed-in user
    Chats,

    /// Create a chat room
    RoomNew {
        name: String,

        /// Room kind: course, specialty or general
        #[arg(long = "kind", default_value = "general")]
        room_type: String,

        #[arg(long)]
        course_id: Option<String>,

        #[arg(long)]
        specialty: Option<String>,

        #[arg(long)]
        semester: Option<i32>,
    },

    /// Read messages from a chat room
    Read {
        /// Room ID (from `chats` output)
        room_id: String,

        /// Maximum number of messages to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Send a message
    Send {
        /// Room ID (from `chats` output)
        #[arg(short, long)]
        to: String,

        /// Message content
        message: String,
    },

    /// Peer-help request board
    #[command(subcommand)]
    HelpBoard(HelpBoardCommands),
}

#[derive(Subcommand)]
enum HelpBoardCommands {
    /// List help requests
    List {
        #[arg(long)]
        specialty: Option<String>,

        #[arg(long)]
        semester: Option<i32>,

        /// open, in_progress or resolved
        #[arg(long)]
        status: Option<String>,
    },

    /// Raise a help request (students)
    Ask {
        title: String,

        #[arg(long)]
        description: String,

        #[arg(long)]
        subject: String,

        #[arg(long)]
        course_id: Option<String>,

        /// low, medium or high
        #[arg(long, default_value = "medium")]
        priority: String,
    },

    /// Respond to a help request
    Respond {
        request_id: String,

        message: String,

        /// Mark the response as the solution
        #[arg(long)]
        solution: bool,
    },

    /// List responses to a help request
    Responses {
        request_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Configure { url, key } => {
            configure(url, key)?;
        }
        Commands::Register {
            email,
            password,
            name,
            role,
            student_id,
            semester,
            specialty,
            enrollment_year,
            teacher_id,
            department,
            specialties,
        } => {
            tracing::info!("Registering {}...", email);
            register(RegisterArgs {
                email,
                password,
                name,
                role,
                student_id,
                semester,
                specialty,
                enrollment_year,
                teacher_id,
                department,
                specialties,
            })
            .await?;
        }
        Commands::Login { email, password } => {
            tracing::info!("Signing in...");
            login(&email, &password).await?;
        }
        Commands::Logout => {
            tracing::info!("Signing out...");
            logout().await?;
        }
        Commands::Status => {
            status()?;
        }
        Commands::Whoami => {
            whoami().await?;
        }
        Commands::Profile { name, avatar } => {
            update_profile(name, avatar).await?;
        }
        Commands::Courses { specialty, semester, teacher } => {
            list_courses(specialty, semester, teacher).await?;
        }
        Commands::CourseNew { name, code, description, semester, specialty } => {
            create_course(name, code, description, semester, specialty).await?;
        }
        Commands::Enroll { course_id } => {
            enroll(&course_id).await?;
        }
        Commands::Chats => {
            tracing::info!("Fetching chat rooms...");
            list_rooms().await?;
        }
        Commands::RoomNew { name, room_type, course_id, specialty, semester } => {
            create_room(name, &room_type, course_id, specialty, semester).await?;
        }
        Commands::Read { room_id, limit } => {
            read_messages(&room_id, limit).await?;
        }
        Commands::Send { to, message } => {
            tracing::info!("Sending message...");
            send_message(&to, &message).await?;
        }
        Commands::HelpBoard(command) => match command {
            HelpBoardCommands::List { specialty, semester, status } => {
                list_help_requests(specialty, semester, status).await?;
            }
            HelpBoardCommands::Ask { title, description, subject, course_id, priority } => {
                ask_for_help(title, description, subject, course_id, &priority).await?;
            }
            HelpBoardCommands::Respond { request_id, message, solution } => {
                respond_to_request(&request_id, message, solution).await?;
            }
            HelpBoardCommands::Responses { request_id } => {
                list_responses(&request_id).await?;
            }
        },
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Command handlers: local validation, one facade call, printed results.
// ---------------------------------------------------------------------------

struct RegisterArgs {
    email: String,
    password: String,
    name: String,
    role: String,
    student_id: Option<String>,
    semester: Option<i32>,
    specialty: Option<String>,
    enrollment_year: Option<i32>,
    teacher_id: Option<String>,
    department: Option<String>,
    specialties: Vec<String>,
}

fn parse_role(role: &str) -> Result<Role> {
    match role {
        "student" => Ok(Role::Student),
        "teacher" => Ok(Role::Teacher),
        other => bail!("Unknown role '{}'. Use 'student' or 'teacher'.", other),
    }
}

fn parse_room_type(kind: &str) -> Result<RoomType> {
    match kind {
        "course" => Ok(RoomType::Course),
        "specialty" => Ok(RoomType::Specialty),
        "general" => Ok(RoomType::General),
        other => bail!("Unknown room kind '{}'. Use 'course', 'specialty' or 'general'.", other),
    }
}

fn parse_status(status: &str) -> Result<HelpStatus> {
    match status {
        "open" => Ok(HelpStatus::Open),
        "in_progress" => Ok(HelpStatus::InProgress),
        "resolved" => Ok(HelpStatus::Resolved),
        other => bail!("Unknown status '{}'. Use 'open', 'in_progress' or 'resolved'.", other),
    }
}

fn parse_priority(priority: &str) -> Result<HelpPriority> {
    match priority {
        "low" => Ok(HelpPriority::Low),
        "medium" => Ok(HelpPriority::Medium),
        "high" => Ok(HelpPriority::High),
        other => bail!("Unknown priority '{}'. Use 'low', 'medium' or 'high'.", other),
    }
}

fn configure(url: String, key: String) -> Result<()> {
    let mut config = Config::load()?;
    config.set_backend(url, key);
    config.save()?;
    println!("Backend configured.");
    Ok(())
}

/// Signed-in user's profile, or a clear pointer to `login`.
async fn require_user(backend: &dyn Backend) -> Result<User> {
    let config = Config::load()?;
    let user_id = config
        .get_user_id()
        .context("Not signed in. Run 'educonnect login'.")?;
    api::get_user_profile(backend, &user_id)
        .await
        .context("Failed to load the signed-in profile")
}

async fn bridge() -> Result<(SessionBridge, Arc<BackendClient>)> {
    let config = Config::load()?;
    let auth: Arc<dyn AuthApi> = Arc::new(AuthService::from_config(&config)?);
    let backend = Arc::new(BackendClient::new().await?);
    let bridge = SessionBridge::start(auth, backend.clone() as Arc<dyn Backend>).await;
    Ok((bridge, backend))
}

/// Role-specific registration fields, validated before anything goes
/// remote.
enum RoleProfile {
    Student { student_id: String, semester: i32, specialty: String, enrollment_year: i32 },
    Teacher { teacher_id: String, department: String, specialties: Vec<String> },
}

fn parse_role_profile(role: Role, args: &RegisterArgs) -> Result<RoleProfile> {
    match role {
        Role::Student => {
            let (Some(student_id), Some(semester), Some(specialty), Some(enrollment_year)) = (
                args.student_id.clone(),
                args.semester,
                args.specialty.clone(),
                args.enrollment_year,
            ) else {
                bail!(
                    "Student registration needs --student-id, --semester, --specialty and --enrollment-year."
                );
            };
            Ok(RoleProfile::Student { student_id, semester, specialty, enrollment_year })
        }
        Role::Teacher => {
            let (Some(teacher_id), Some(department)) =
                (args.teacher_id.clone(), args.department.clone())
            else {
                bail!("Teacher registration needs --teacher-id and --department.");
            };
            Ok(RoleProfile::Teacher {
                teacher_id,
                department,
                specialties: args.specialties.clone(),
            })
        }
    }
}

async fn register(args: RegisterArgs) -> Result<()> {
    let role = parse_role(&args.role)?;
    let role_profile = parse_role_profile(role, &args)?;

    let (session, backend) = bridge().await?;
    let user = session
        .sign_up(
            &args.email,
            &args.password,
            &NewUser {
                full_name: args.name.clone(),
                role,
                avatar_url: None,
            },
        )
        .await
        .context("Registration failed")?;

    match role_profile {
        RoleProfile::Student { student_id, semester, specialty, enrollment_year } => {
            api::create_student_profile(
                backend.as_ref(),
                &NewStudent {
                    id: user.id.clone(),
                    student_id,
                    semester,
                    specialty,
                    enrollment_year,
                },
            )
            .await
            .context("Account created, but the student profile could not be saved")?;
        }
        RoleProfile::Teacher { teacher_id, department, specialties } => {
            api::create_teacher_profile(
                backend.as_ref(),
                &NewTeacher {
                    id: user.id.clone(),
                    teacher_id,
                    department,
                    specialties,
                },
            )
            .await
            .context("Account created, but the teacher profile could not be saved")?;
        }
    }

    println!("Registered {} as {} ({}).", user.email, user.full_name, role.as_str());
    Ok(())
}

async fn login(email: &str, password: &str) -> Result<()> {
    let (session, _backend) = bridge().await?;
    session
        .sign_in(email, password)
        .await
        .context("Sign-in failed")?;

    match session.current_user() {
        Some(user) => println!("Signed in as {} ({}).", user.full_name, user.email),
        None => println!("Signed in, but no profile row exists yet."),
    }
    Ok(())
}

async fn logout() -> Result<()> {
    let config = Config::load()?;
    let auth = AuthService::from_config(&config)?;
    auth.sign_out().await.context("Sign-out failed")?;
    println!("Signed out.");
    Ok(())
}

fn status() -> Result<()> {
    let config = Config::load()?;

    match config.require_backend() {
        Ok((url, _)) => println!("Backend: {}", url),
        Err(_) => {
            println!("Backend: not configured");
            return Ok(());
        }
    }

    match (config.get_user_email(), config.get_access_token()) {
        (Some(email), Some(token)) => {
            let state = if token.is_expired() { "expired" } else { "valid" };
            println!("Signed in: {} (session {})", email, state);
        }
        _ => println!("Signed in: no"),
    }
    Ok(())
}

async fn whoami() -> Result<()> {
    let (session, backend) = bridge().await?;
    let user = session
        .current_user()
        .context("Not signed in. Run 'educonnect login'.")?;

    println!("{} <{}>", user.full_name, user.email);
    println!("  Role: {}", user.role.as_str());

    match user.role {
        Role::Student => {
            let student = api::get_student_profile(backend.as_ref(), &user.id).await?;
            println!(
                "  Student {} -- {} semester {}, enrolled {}",
                student.student_id, student.specialty, student.semester, student.enrollment_year
            );
        }
        Role::Teacher => {
            let teacher = api::get_teacher_profile(backend.as_ref(), &user.id).await?;
            println!(
                "  Teacher {} -- {} ({})",
                teacher.teacher_id,
                teacher.department,
                teacher.specialties.join(", ")
            );
        }
    }
    Ok(())
}

async fn update_profile(name: Option<String>, avatar: Option<String>) -> Result<()> {
    let updates = UserUpdate { full_name: name, avatar_url: avatar };
    if updates.is_empty() {
        bail!("Nothing to update. Pass --name and/or --avatar.");
    }

    let (session, _backend) = bridge().await?;
    let user = session
        .update_profile(&updates)
        .await
        .context("Profile update failed")?;
    println!("Profile updated: {} <{}>", user.full_name, user.email);
    Ok(())
}

async fn list_courses(
    specialty: Option<String>,
    semester: Option<i32>,
    teacher: Option<String>,
) -> Result<()> {
    let backend = BackendClient::new().await?;

    let courses = if let Some(teacher_id) = teacher {
        api::get_courses_by_teacher(&backend, &teacher_id).await?
    } else {
        let (specialty, semester) = match (specialty, semester) {
            (Some(s), Some(n)) => (s, n),
            _ => bail!("Pass --specialty and --semester, or --teacher <id>."),
        };
        api::get_courses_by_specialty(&backend, &specialty, semester).await?
    };

    if courses.is_empty() {
        println!("(no courses found)");
        return Ok(());
    }

    for course in &courses {
        println!("{} [{}]", course.name, course.code);
        println!("  ID: {}", course.id);
        if let Some(ref teacher) = course.teacher {
            if let Some(ref identity) = teacher.user {
                println!("  Taught by: {}", identity.full_name);
            }
        }
        if !course.description.is_empty() {
            println!("  {}", course.description);
        }
        println!();
    }
    Ok(())
}

async fn create_course(
    name: String,
    code: String,
    description: String,
    semester: i32,
    specialty: String,
) -> Result<()> {
    let backend = BackendClient::new().await?;
    let user = require_user(&backend).await?;
    if user.role != Role::Teacher {
        bail!("Only teachers can create courses.");
    }

    let course = api::create_course(
        &backend,
        &NewCourse {
            name,
            code,
            description,
            semester,
            specialty,
            teacher_id: user.id,
        },
    )
    .await
    .context("Course creation failed")?;
    println!("Created course {} [{}] -- ID {}", course.name, course.code, course.id);
    Ok(())
}

async fn enroll(course_id: &str) -> Result<()> {
    let backend = BackendClient::new().await?;
    let user = require_user(&backend).await?;
    if user.role != Role::Student {
        bail!("Only students can enroll in courses.");
    }

    let enrollment = api::enroll_student(&backend, &user.id, course_id)
        .await
        .context("Enrollment failed")?;
    println!("Enrolled in course {}.", enrollment.course_id);
    Ok(())
}

async fn list_rooms() -> Result<()> {
    let backend = BackendClient::new().await?;
    let user = require_user(&backend).await?;

    let rooms = api::list_chat_rooms(&backend, &user.id, user.role).await?;

    println!("\nChat Rooms:");
    println!("{:-<60}", "");

    if rooms.is_empty() {
        println!("  (no rooms found)");
        return Ok(());
    }

    for room in &rooms {
        println!("{}", room.name);
        println!("  ID: {}", room.id);
        let scope = match (&room.specialty, &room.course_id) {
            (Some(specialty), _) => format!("specialty {}", specialty),
            (None, Some(course)) => format!("course {}", course),
            (None, None) => "everyone".to_string(),
        };
        println!("  Scope: {}", scope);
        println!();
    }
    Ok(())
}

async fn create_room(
    name: String,
    kind: &str,
    course_id: Option<String>,
    specialty: Option<String>,
    semester: Option<i32>,
) -> Result<()> {
    let room_type = parse_room_type(kind)?;
    match room_type {
        RoomType::Course if course_id.is_none() => bail!("Course rooms need --course-id."),
        RoomType::Specialty if specialty.is_none() => bail!("Specialty rooms need --specialty."),
        _ => {}
    }

    let backend = BackendClient::new().await?;
    let user = require_user(&backend).await?;

    let room = api::create_chat_room(
        &backend,
        &NewChatRoom {
            name,
            room_type,
            course_id,
            specialty,
            semester,
            created_by: user.id,
        },
    )
    .await
    .context("Room creation failed")?;
    println!("Created room {} -- ID {}", room.name, room.id);
    Ok(())
}

async fn read_messages(room_id: &str, limit: usize) -> Result<()> {
    let backend = BackendClient::new().await?;
    let mut messages = api::get_chat_messages(&backend, room_id, Some(limit)).await?;

    if messages.is_empty() {
        println!("(no messages)");
        return Ok(());
    }

    // The page arrives newest-first; reverse for chronological display.
    messages.reverse();
    for message in &messages {
        let sender = message
            .user
            .as_ref()
            .map(|u| u.full_name.as_str())
            .unwrap_or("?");
        let time = message
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!("[{}] {}: {}", time, sender, message.content);
    }
    Ok(())
}

async fn send_message(room_id: &str, content: &str) -> Result<()> {
    let backend = BackendClient::new().await?;
    let user = require_user(&backend).await?;

    api::send_message(
        &backend,
        &NewMessage {
            chat_room_id: room_id.to_string(),
            user_id: user.id,
            content: content.to_string(),
            message_type: MessageType::Text,
        },
    )
    .await
    .context("Message send failed")?;
    println!("Message sent.");
    Ok(())
}

async fn list_help_requests(
    specialty: Option<String>,
    semester: Option<i32>,
    status: Option<String>,
) -> Result<()> {
    let status = status.as_deref().map(parse_status).transpose()?;
    let backend = BackendClient::new().await?;

    let requests = api::list_help_requests(
        &backend,
        &api::HelpRequestFilters { specialty, semester, status },
    )
    .await?;

    if requests.is_empty() {
        println!("(no help requests)");
        return Ok(());
    }

    for request in &requests {
        let priority = match request.priority {
            HelpPriority::Low => "low",
            HelpPriority::Medium => "medium",
            HelpPriority::High => "high",
        };
        println!("[{}] {} ({})", request.status.as_str(), request.title, priority);
        println!("  ID: {}", request.id);
        println!("  Subject: {}", request.subject);
        if let Some(ref student) = request.student {
            if let Some(ref identity) = student.user {
                println!("  Asked by: {}", identity.full_name);
            }
        }
        println!();
    }
    Ok(())
}

async fn ask_for_help(
    title: String,
    description: String,
    subject: String,
    course_id: Option<String>,
    priority: &str,
) -> Result<()> {
    let priority = parse_priority(priority)?;
    let backend = BackendClient::new().await?;
    let user = require_user(&backend).await?;
    if user.role != Role::Student {
        bail!("Only students can raise help requests.");
    }

    let request = api::create_help_request(
        &backend,
        &NewHelpRequest {
            title,
            description,
            subject,
            course_id,
            student_id: user.id,
            priority,
        },
    )
    .await
    .context("Help request failed")?;
    println!("Raised request {} -- status {}.", request.id, request.status.as_str());
    Ok(())
}

async fn respond_to_request(request_id: &str, message: String, solution: bool) -> Result<()> {
    let backend = BackendClient::new().await?;
    let user = require_user(&backend).await?;

    let mut response = NewHelpResponse::new(request_id, user.id, message);
    if solution {
        response = response.solution();
    }

    api::add_help_response(&backend, &response)
        .await
        .context("Response failed")?;
    println!("Response added.");
    Ok(())
}

async fn list_responses(request_id: &str) -> Result<()> {
    let backend = BackendClient::new().await?;
    let responses = api::list_help_responses(&backend, request_id).await?;

    if responses.is_empty() {
        println!("(no responses yet)");
        return Ok(());
    }

    for response in &responses {
        let author = response
            .user
            .as_ref()
            .map(|u| u.full_name.as_str())
            .unwrap_or("?");
        let marker = if response.is_solution { " [solution]" } else { "" };
        println!("{}{}: {}", author, marker, response.content);
    }
    Ok(())
}
