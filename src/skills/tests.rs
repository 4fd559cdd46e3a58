use super::*;
use std::path::Path;

fn write_skill(root: &Path, dir: &str, body: &str) {
    let skill_dir = root.join(dir);
    std::fs::create_dir_all(&skill_dir).unwrap();
    std::fs::write(skill_dir.join(SKILL_FILE), body).unwrap();
}

#[test]
fn test_scan_parses_front_matter() {
    let root = tempfile::tempdir().unwrap();
    write_skill(
        root.path(),
        "pdf",
        "---\nname: pdf\ndescription: Work with PDF files\n---\n# PDF\n\nUse scripts/extract.py\n",
    );

    let loader = SkillLoader::new(vec![root.path().to_path_buf()]);
    let skills = loader.scan_skills();

    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0].name, "pdf");
    assert_eq!(skills[0].description, "Work with PDF files");
    assert_eq!(skills[0].skill_path, root.path().join("pdf"));
    assert_eq!(skills[0].to_prompt_line(), "- **pdf**: Work with PDF files");
}

#[test]
fn test_scan_skips_invalid_bundles() {
    let root = tempfile::tempdir().unwrap();
    write_skill(root.path(), "no-front", "# Just markdown\n");
    write_skill(root.path(), "no-name", "---\ndescription: nameless\n---\nbody\n");
    write_skill(root.path(), "bad-yaml", "---\nname: [unclosed\n---\nbody\n");
    std::fs::create_dir_all(root.path().join("empty-dir")).unwrap();
    std::fs::write(root.path().join("stray.md"), "---\nname: stray\n---\n").unwrap();
    write_skill(root.path(), "good", "---\nname: good\n---\nbody\n");

    let loader = SkillLoader::new(vec![
        root.path().join("missing"),
        root.path().to_path_buf(),
    ]);
    let names: Vec<String> = loader.scan_skills().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["good".to_string()]);
}

#[test]
fn test_first_path_wins_on_duplicate_names() {
    let project = tempfile::tempdir().unwrap();
    let user = tempfile::tempdir().unwrap();
    write_skill(project.path(), "a", "---\nname: shared\ndescription: project\n---\nP\n");
    write_skill(user.path(), "b", "---\nname: shared\ndescription: user\n---\nU\n");
    write_skill(user.path(), "c", "---\nname: extra\ndescription: user only\n---\nX\n");

    let loader = SkillLoader::new(vec![project.path().to_path_buf(), user.path().to_path_buf()]);
    let skills = loader.scan_skills();

    assert_eq!(skills.len(), 2);
    assert_eq!(skills[0].description, "project");
    assert_eq!(skills[1].name, "extra");
    assert_eq!(loader.load_skill("shared").unwrap().instructions, "P");
}

#[test]
fn test_load_skill_rescans_on_miss() {
    let root = tempfile::tempdir().unwrap();
    let loader = SkillLoader::new(vec![root.path().to_path_buf()]);
    assert!(loader.load_skill("late").is_none());

    write_skill(root.path(), "late", "---\nname: late\n---\n\n  Step one\n\n");
    let skill = loader.load_skill("late").unwrap();
    assert_eq!(skill.metadata.name, "late");
    assert_eq!(skill.instructions, "Step one");
}

#[test]
fn test_extract_instructions() {
    assert_eq!(extract_instructions("---\nname: x\n---\n\nBody\n"), "Body");
    assert_eq!(extract_instructions("no front matter"), "no front matter");
}

#[test]
fn test_default_paths_order() {
    let paths = SkillLoader::default_paths(Path::new("/proj"), Some(Path::new("/home/u")));
    assert_eq!(
        paths,
        vec![
            Path::new("/proj/.claude/skills").to_path_buf(),
            Path::new("/proj/.agents/skills").to_path_buf(),
            Path::new("/home/u/.agents/skills").to_path_buf(),
            Path::new("/home/u/.claude/skills").to_path_buf(),
        ]
    );
    assert_eq!(SkillLoader::default_paths(Path::new("/p"), None).len(), 2);
}

#[test]
fn test_build_system_prompt_with_skills() {
    let root = tempfile::tempdir().unwrap();
    write_skill(root.path(), "news", "---\nname: news\ndescription: Extract news\n---\nX\n");

    let loader = SkillLoader::new(vec![root.path().to_path_buf()]);
    let prompt = loader.build_system_prompt("Base prompt.");

    assert!(prompt.starts_with("Base prompt.\n\n## Available Skills\n\n"));
    assert!(prompt.contains("- **news**: Extract news\n"));
    assert!(prompt.contains("### How to Use Skills"));
    assert!(prompt.contains("`load_skill(skill_name)`"));
}

#[test]
fn test_build_system_prompt_without_skills() {
    let loader = SkillLoader::new(Vec::new());
    assert_eq!(
        loader.build_system_prompt(""),
        "You are a helpful coding assistant.\n\n## Skills\n\nNo skills currently available.\n"
    );
}
