use colored::*;

/// Turns common compiler and linker failures into a short hint.
pub struct FeedbackAnalyzer;

impl FeedbackAnalyzer {
    pub fn analyze(output: &str) -> Option<String> {
        // 1. Unresolved symbol (Linker Error)
        if output.contains("undefined reference to")
            || output.contains("Undefined symbols for architecture")
        {
            return Some(format!(
                "It looks like a {} error.\nIf the symbol lives in another library of this project, add it to {} of the library being linked.\nFor system libraries, list them in {}.",
                "Linker".bold().red(),
                "depends".bold().yellow(),
                "[build] libs".bold().yellow()
            ));
        }

        // 2. Missing Header (Compiler Error)
        if output.contains("fatal error: ") && output.contains("No such file or directory")
            || output.contains("file not found")
        {
            return Some(format!(
                "It looks like a {} error.\nHeaders of another library are only visible to libraries that declare it in {}.",
                "Missing Header".bold().red(),
                "depends".bold().yellow()
            ));
        }

        // 3. Non-PIC object in a shared library
        if output.contains("recompile with -fPIC") {
            return Some(format!(
                "A static object was linked into a shared library.\nRemove {} from {} or rebuild that dependency as position independent code.",
                "-fno-pic".bold(),
                "[build] flags".bold().yellow()
            ));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linker_error() {
        let err = "b.cpp:(.text+0x5): undefined reference to `core_fn()'";
        let msg = FeedbackAnalyzer::analyze(err).unwrap();
        assert!(msg.contains("Linker"));
        assert!(msg.contains("depends"));
    }

    #[test]
    fn test_include_error() {
        let err = "fatal error: a.h: No such file or directory";
        let msg = FeedbackAnalyzer::analyze(err).unwrap();
        assert!(msg.contains("Missing Header"));

        let clang = "b.cpp:1:10: fatal error: 'a.h' file not found";
        assert!(FeedbackAnalyzer::analyze(clang).unwrap().contains("Missing Header"));
    }

    #[test]
    fn test_pic_error() {
        let err = "relocation R_X86_64_32 against `.rodata' can not be used; recompile with -fPIC";
        assert!(FeedbackAnalyzer::analyze(err).is_some());
    }

    #[test]
    fn test_unknown_output() {
        assert!(FeedbackAnalyzer::analyze("error: expected ';'").is_none());
    }
}
