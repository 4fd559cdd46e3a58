mod bash;
mod edit;
mod glob_tool;
mod grep;
mod list_dir;
mod load_skill;
mod process;
mod python;
mod read_file;
mod write;

pub use bash::BashTool;
pub use edit::EditTool;
pub use glob_tool::GlobTool;
pub use grep::GrepTool;
pub use list_dir::ListDirTool;
pub use load_skill::LoadSkillTool;
pub use python::PythonTool;
pub use read_file::ReadFileTool;
pub use write::WriteFileTool;

use crate::core::tool::Tool;
use std::sync::Arc;


pub fn create_all_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(LoadSkillTool),
        Arc::new(BashTool),
        Arc::new(ReadFileTool),
        Arc::new(WriteFileTool),
        Arc::new(GlobTool),
        Arc::new(GrepTool),
        Arc::new(EditTool),
        Arc::new(ListDirTool),
        Arc::new(PythonTool),
    ]
}
