use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use cursus::Config;
use cursus::client::{BackendClient, ClientError, UserContext, UserRole};
use cursus::model::builder::can_remove;
use cursus::model::{
    CourseContent, CurriculumBuilder, LessonPatch, ModulePatch, Part, PartPatch,
    parse_course_content_str,
};
use cursus::player::{CurriculumViewer, ExpandMode};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(about = "CLI tool for authoring course content", long_about = None)]
pub struct Cli {
    /// Course content file
    #[arg(long, short, global = true, default_value = "course.json")]
    pub file: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a content file with one part, module and lesson
    Init {
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Print the curriculum tree
    Outline,

    /// Assign missing ids and rewrite the file in canonical form
    Normalize,

    /// Manage parts
    Part {
        #[command(subcommand)]
        action: PartCommands,
    },

    /// Manage modules
    Module {
        #[command(subcommand)]
        action: ModuleCommands,
    },

    /// Manage lessons
    Lesson {
        #[command(subcommand)]
        action: LessonCommands,
    },

    /// Download a course's content into the file
    Pull {
        #[arg(long)]
        course: u64,
    },

    /// Upload the file as a course's content
    Push {
        #[arg(long)]
        course: u64,
        /// Role of the acting user: student, instructor or admin
        #[arg(long, default_value = "student")]
        role: String,
    },
}

/// Part management
#[derive(Subcommand, Debug)]
pub enum PartCommands {
    Add,
    Remove {
        #[arg(long)]
        part: String,
        /// Allow removing the last part
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    Update {
        #[arg(long)]
        part: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
}

/// Module management
#[derive(Subcommand, Debug)]
pub enum ModuleCommands {
    Add {
        #[arg(long)]
        part: String,
    },
    Remove {
        #[arg(long)]
        part: String,
        #[arg(long)]
        module: String,
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    Update {
        #[arg(long)]
        part: String,
        #[arg(long)]
        module: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
}

/// Lesson management
#[derive(Subcommand, Debug)]
pub enum LessonCommands {
    Add {
        #[arg(long)]
        part: String,
        #[arg(long)]
        module: String,
    },
    Remove {
        #[arg(long)]
        part: String,
        #[arg(long)]
        module: String,
        #[arg(long)]
        lesson: String,
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    Update {
        #[arg(long)]
        part: String,
        #[arg(long)]
        module: String,
        #[arg(long)]
        lesson: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        video_url: Option<String>,
        #[arg(long)]
        duration: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("backend error: {0}")]
    Client(#[from] ClientError),
    #[error("{0} already exists, pass --force to overwrite")]
    FileExists(PathBuf),
    #[error("{0} holds no course content, run `init` or `pull` first")]
    NoContent(PathBuf),
    #[error("no {kind} with id `{id}`")]
    UnknownId { kind: &'static str, id: String },
    #[error("refusing to remove the last {0}, pass --force to do it anyway")]
    LastItem(&'static str),
}

type CliResult<T> = Result<T, CliError>;

fn load(path: &Path) -> CliResult<CourseContent> {
    let raw = std::fs::read_to_string(path)?;
    parse_course_content_str(&raw).ok_or_else(|| CliError::NoContent(path.to_path_buf()))
}

fn save(path: &Path, content: &CourseContent) -> CliResult<()> {
    let json = serde_json::to_string_pretty(content)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn find_part<'a>(content: &'a CourseContent, part_id: &str) -> CliResult<&'a Part> {
    content
        .parts()
        .iter()
        .find(|p| p.id() == part_id)
        .ok_or_else(|| CliError::UnknownId {
            kind: "part",
            id: part_id.to_string(),
        })
}

fn check_module(content: &CourseContent, part_id: &str, module_id: &str) -> CliResult<usize> {
    let part = find_part(content, part_id)?;
    let module = part.module(module_id).ok_or_else(|| CliError::UnknownId {
        kind: "module",
        id: module_id.to_string(),
    })?;
    Ok(module.lessons().len())
}

fn check_lesson(
    content: &CourseContent,
    part_id: &str,
    module_id: &str,
    lesson_id: &str,
) -> CliResult<usize> {
    let siblings = check_module(content, part_id, module_id)?;
    let known = find_part(content, part_id)?
        .module(module_id)
        .and_then(|m| m.lesson(lesson_id))
        .is_some();
    if !known {
        return Err(CliError::UnknownId {
            kind: "lesson",
            id: lesson_id.to_string(),
        });
    }
    Ok(siblings)
}

fn guard_removal(siblings: usize, force: bool, level: &'static str) -> CliResult<()> {
    if !force && !can_remove(siblings) {
        return Err(CliError::LastItem(level));
    }
    Ok(())
}

/// Runs one builder operation against the content and stores the result back into it.
fn edit<F>(content: &mut CourseContent, op: F)
where
    F: FnOnce(&mut CurriculumBuilder<&mut dyn FnMut(Vec<Part>)>, &[Part]),
{
    let current = content.parts().to_vec();
    let mut apply = |parts: Vec<Part>| content.set_parts(parts);
    let mut builder = CurriculumBuilder::new(&mut apply as &mut dyn FnMut(Vec<Part>));
    op(&mut builder, &current);
}

fn part_command(content: &mut CourseContent, action: PartCommands) -> CliResult<()> {
    match action {
        PartCommands::Add => {
            edit(content, |b, parts| b.add_part(parts));
            if let Some(part) = content.parts().last() {
                println!("Part added: {}", part.id());
            }
        }
        PartCommands::Remove { part, force } => {
            find_part(content, &part)?;
            guard_removal(content.parts().len(), force, "part")?;
            edit(content, |b, parts| b.remove_part(parts, &part));
            println!("Part removed: {part}");
        }
        PartCommands::Update { part, title, description } => {
            find_part(content, &part)?;
            let patch = PartPatch { title, description };
            edit(content, |b, parts| b.update_part(parts, &part, patch));
            println!("Part updated: {part}");
        }
    }
    Ok(())
}

fn module_command(content: &mut CourseContent, action: ModuleCommands) -> CliResult<()> {
    match action {
        ModuleCommands::Add { part } => {
            find_part(content, &part)?;
            edit(content, |b, parts| b.add_module(parts, &part));
            let added = find_part(content, &part)?.modules().last().map(|m| m.id().to_string());
            if let Some(id) = added {
                println!("Module added: {id}");
            }
        }
        ModuleCommands::Remove { part, module, force } => {
            check_module(content, &part, &module)?;
            guard_removal(find_part(content, &part)?.modules().len(), force, "module")?;
            edit(content, |b, parts| b.remove_module(parts, &part, &module));
            println!("Module removed: {module}");
        }
        ModuleCommands::Update { part, module, title, description } => {
            check_module(content, &part, &module)?;
            let patch = ModulePatch { title, description };
            edit(content, |b, parts| b.update_module(parts, &part, &module, patch));
            println!("Module updated: {module}");
        }
    }
    Ok(())
}

fn lesson_command(content: &mut CourseContent, action: LessonCommands) -> CliResult<()> {
    match action {
        LessonCommands::Add { part, module } => {
            check_module(content, &part, &module)?;
            edit(content, |b, parts| b.add_lesson(parts, &part, &module));
            let added = find_part(content, &part)?
                .module(&module)
                .and_then(|m| m.lessons().last())
                .map(|l| l.id().to_string());
            if let Some(id) = added {
                println!("Lesson added: {id}");
            }
        }
        LessonCommands::Remove { part, module, lesson, force } => {
            let siblings = check_lesson(content, &part, &module, &lesson)?;
            guard_removal(siblings, force, "lesson")?;
            edit(content, |b, parts| b.remove_lesson(parts, &part, &module, &lesson));
            println!("Lesson removed: {lesson}");
        }
        LessonCommands::Update {
            part,
            module,
            lesson,
            title,
            description,
            video_url,
            duration,
        } => {
            check_lesson(content, &part, &module, &lesson)?;
            let patch = LessonPatch {
                title,
                description,
                video_url,
                duration,
            };
            edit(content, |b, parts| b.update_lesson(parts, &part, &module, &lesson, patch));
            println!("Lesson updated: {lesson}");
        }
    }
    Ok(())
}

async fn backend() -> CliResult<(&'static Config, BackendClient)> {
    let config = Config::get_or_init(cfg!(debug_assertions)).await;
    Ok((config, BackendClient::from_config(config)?))
}

#[tokio::main]
async fn main() -> CliResult<()> {
    cursus::setup_trace();
    let args = Cli::parse();
    let file = args.file;

    match args.command {
        Commands::Init { force } => {
            if file.exists() && !force {
                return Err(CliError::FileExists(file));
            }
            let content = CourseContent::seeded();
            save(&file, &content)?;
            println!("Content created: {}", file.display());
        }

        Commands::Outline => {
            let content = load(&file)?;
            let mut viewer = CurriculumViewer::new(Some(content.clone()), ExpandMode::Free);
            viewer.view_mut().expand_all(&content);
            print!("{}", viewer.render());
        }

        Commands::Normalize => {
            let content = load(&file)?;
            save(&file, &content)?;
            println!("Content normalized: {} lessons", content.lesson_count());
        }

        Commands::Part { action } => {
            let mut content = load(&file)?;
            part_command(&mut content, action)?;
            save(&file, &content)?;
        }

        Commands::Module { action } => {
            let mut content = load(&file)?;
            module_command(&mut content, action)?;
            save(&file, &content)?;
        }

        Commands::Lesson { action } => {
            let mut content = load(&file)?;
            lesson_command(&mut content, action)?;
            save(&file, &content)?;
        }

        Commands::Pull { course } => {
            let (_, client) = backend().await?;
            let course = client.fetch_course(course).await?;
            let title = course.title().to_string();
            let content = course.into_content().unwrap_or_default();
            save(&file, &content)?;
            println!("Pulled `{title}`: {} lessons", content.lesson_count());
        }

        Commands::Push { course, role } => {
            let (config, client) = backend().await?;
            let user = UserContext::new(config.player().user_id(), UserRole::from(role.as_str()));
            user.require_editor()?;

            let content = load(&file)?;
            client.save_course_content(course, &content).await?;
            tracing::info!("pushed {} to course {course}", file.display());
            println!("Content pushed to course {course}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn edit_goes_through_builder_test() {
        let mut content = CourseContent::seeded();
        part_command(&mut content, PartCommands::Add).unwrap();
        assert_eq!(content.parts().len(), 2);

        let part = content.parts()[1].id().to_string();
        part_command(
            &mut content,
            PartCommands::Update {
                part: part.clone(),
                title: Some("Welding".into()),
                description: None,
            },
        )
        .unwrap();
        assert_eq!(content.parts()[1].title(), "Welding");
    }

    #[test]
    fn last_item_guard_test() {
        let mut content = CourseContent::seeded();
        let part = content.parts()[0].id().to_string();
        let module = content.parts()[0].modules()[0].id().to_string();
        let lesson = content.parts()[0].modules()[0].lessons()[0].id().to_string();

        let result = lesson_command(
            &mut content,
            LessonCommands::Remove {
                part: part.clone(),
                module: module.clone(),
                lesson: lesson.clone(),
                force: false,
            },
        );
        assert!(matches!(result, Err(CliError::LastItem("lesson"))));
        assert_eq!(content.lesson_count(), 1);

        lesson_command(
            &mut content,
            LessonCommands::Remove { part, module, lesson, force: true },
        )
        .unwrap();
        assert_eq!(content.lesson_count(), 0);
    }

    #[test]
    fn unknown_id_test() {
        let mut content = CourseContent::seeded();
        let result = module_command(&mut content, ModuleCommands::Add { part: "nope".into() });
        assert!(matches!(result, Err(CliError::UnknownId { kind: "part", .. })));
    }
}
