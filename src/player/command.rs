use std::fmt::Write as _;

use crate::player::{CoursePlayer, PlayerResult};

pub const HELP: &str = "\
commands:
  next | n            mark the current lesson done and move on
  prev | p            go back one lesson
  goto P M L          jump to part P, module M, lesson L (1-based)
  done | d            mark the current lesson done
  undo | u            mark the current lesson not done
  show | s            show the current lesson
  outline | o         show the course outline
  open ID             expand or collapse a part or module in the outline
  help | h            this text
  quit | q            save progress and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    Next,
    Prev,
    Goto(usize, usize, usize),
    Done,
    Undo,
    Show,
    Outline,
    Open(String),
    Help,
    Quit,
}

impl PlayerCommand {
    /// Parses one input line. `None` for blank lines; unknown input yields `Err` with a hint.
    pub fn parse(line: &str) -> Option<Result<Self, String>> {
        let mut words = line.split_whitespace();
        let head = words.next()?.to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        let command = match (head.as_str(), args.as_slice()) {
            ("next" | "n", []) => Ok(Self::Next),
            ("prev" | "p", []) => Ok(Self::Prev),
            ("done" | "d", []) => Ok(Self::Done),
            ("undo" | "u", []) => Ok(Self::Undo),
            ("show" | "s", []) => Ok(Self::Show),
            ("outline" | "o", []) => Ok(Self::Outline),
            ("help" | "h" | "?", []) => Ok(Self::Help),
            ("quit" | "q" | "exit", []) => Ok(Self::Quit),
            ("open", [id]) => Ok(Self::Open(id.to_string())),
            ("goto" | "g", [p, m, l]) => parse_position(p, m, l),
            _ => Err(format!("unknown command `{}`, type `help`", line.trim())),
        };
        Some(command)
    }
}

fn parse_position(p: &str, m: &str, l: &str) -> Result<PlayerCommand, String> {
    let one_based = |s: &str| {
        s.parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .ok_or_else(|| format!("`{s}` is not a position, positions start at 1"))
    };
    Ok(PlayerCommand::Goto(one_based(p)?, one_based(m)?, one_based(l)?))
}

/// Applies a command and returns what to print.
pub fn apply(player: &mut CoursePlayer, command: &PlayerCommand) -> PlayerResult<String> {
    let out = match command {
        PlayerCommand::Next => {
            if !player.go_next() {
                let mut out = String::from("That was the last lesson.\n");
                out.push_str(&render_lesson(player));
                return Ok(out);
            }
            render_lesson(player)
        }
        PlayerCommand::Prev => {
            if !player.go_prev() {
                return Ok(String::from("Already at the first lesson.\n"));
            }
            render_lesson(player)
        }
        PlayerCommand::Goto(p, m, l) => {
            player.go_to_lesson(*p, *m, *l)?;
            render_lesson(player)
        }
        PlayerCommand::Done => {
            player.mark_current_complete();
            render_lesson(player)
        }
        PlayerCommand::Undo => {
            player.mark_current_incomplete();
            render_lesson(player)
        }
        PlayerCommand::Show => render_lesson(player),
        PlayerCommand::Outline => player.render_sidebar(),
        PlayerCommand::Open(id) => {
            let is_part = player.content().parts().iter().any(|p| p.id() == id);
            if is_part {
                player.view_mut().toggle_part(id);
            } else {
                player.view_mut().toggle_module(id);
            }
            player.render_sidebar()
        }
        PlayerCommand::Help => format!("{HELP}\n"),
        PlayerCommand::Quit => String::new(),
    };
    Ok(out)
}

pub fn render_lesson(player: &CoursePlayer) -> String {
    let mut out = String::new();
    if let Some(crumb) = player.breadcrumb() {
        let _ = writeln!(out, "{crumb}");
    }

    if let Some(lesson) = player.current_lesson() {
        let done = player
            .current_key()
            .is_some_and(|key| player.is_complete(&key));
        let _ = writeln!(
            out,
            "{} {}{}",
            if done { "[x]" } else { "[ ]" },
            lesson.title(),
            if lesson.duration().is_empty() {
                String::new()
            } else {
                format!(" ({})", lesson.duration())
            }
        );
        let _ = writeln!(out, "{}", player.current_video());
        if !lesson.description().is_empty() {
            let _ = writeln!(out, "{}", lesson.description());
        }
    }

    let _ = writeln!(out, "Progress: {}%", player.progress_percentage());
    if player.show_completion_banner() {
        let _ = writeln!(out, "Congratulations, you have completed {}!", player.title());
    }
    out
}
