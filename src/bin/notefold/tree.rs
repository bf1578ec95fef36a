use notefold::intermediate::{Note, Notebook};

const BRANCH: &str = "\u{251c}\u{2500}\u{2500} ";
const LAST: &str = "\u{2514}\u{2500}\u{2500} ";

pub fn print(root: &Notebook) {
    let mut lines = Vec::new();
    render(root, "", &mut lines);
    for line in lines {
        println!("{}", line);
    }
}

fn note_line(note: &Note) -> String {
    let mut line = note.title.clone();
    if !note.tags.is_empty() {
        let tags: Vec<&str> = note.tags.iter().map(|t| t.title.as_str()).collect();
        line.push_str(&format!(" [{}]", tags.join(", ")));
    }
    let refs = note.resources.len() + note.note_links.len();
    if refs > 0 {
        line.push_str(&format!(" ({} refs)", refs));
    }
    line
}

fn render(notebook: &Notebook, prefix: &str, lines: &mut Vec<String>) {
    let total = notebook.child_notebooks.len() + notebook.child_notes.len();
    let mut index = 0;

    for child in &notebook.child_notebooks {
        index += 1;
        let is_last = index == total;
        lines.push(format!("{}{}{}/", prefix, if is_last { LAST } else { BRANCH }, child.title));
        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "\u{2502}   " });
        render(child, &child_prefix, lines);
    }

    for note in &notebook.child_notes {
        index += 1;
        let is_last = index == total;
        lines.push(format!("{}{}{}", prefix, if is_last { LAST } else { BRANCH }, note_line(note)));
    }
}
