use std::fmt::{self, Write};
use tasklist_core::{Arrangement, Task};

/// Renders `arrangement` as one line per task followed by the remaining count.
///
/// ```text
/// [ ] ! file taxes (2024-02-01)  #7d1c...
/// [ ]   buy milk (2024-03-01)  #a9f0...
/// [x]   walk the dog  #0b3e...
/// 2 tasks remaining
/// ```
pub fn render(arrangement: &Arrangement) -> String {
    let mut out = String::new();
    for task in arrangement.iter() {
        // Writing into a String cannot fail.
        render_task(&mut out, task).ok();
    }
    out.push_str(&remaining(arrangement.active_count()));
    out.push('\n');
    out
}

fn render_task(out: &mut impl Write, task: &Task) -> fmt::Result {
    let check = if task.disabled { "[x]" } else { "[ ]" };
    let flag = if task.priority { "!" } else { " " };
    write!(out, "{check} {flag} {}", task.text)?;
    if let Some(date) = task.created_on() {
        write!(out, " ({})", date.format("%Y-%m-%d"))?;
    }
    writeln!(out, "  #{}", task.id)
}

fn remaining(count: usize) -> String {
    match count {
        1 => "1 task remaining".to_string(),
        n => format!("{n} tasks remaining"),
    }
}
