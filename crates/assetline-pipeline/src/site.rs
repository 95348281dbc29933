//! The standard site task graph

use std::sync::Arc;

use assetline_tasks::{GraphError, Step, TaskGraph, TaskGraphBuilder, TaskId};

use crate::tasks::{
    CleanTask, CssTask, FontsTask, HtmlTask, ImgTask, JsAsyncTask, JsCoreTask, JsPolyfillsTask,
    ServiceWorkerTask,
};

/// Handles to every task of the site graph
#[derive(Debug, Clone, Copy)]
pub struct SiteTasks {
    pub clean: TaskId,
    pub css: TaskId,
    pub js: TaskId,
    pub js_core: TaskId,
    pub js_async: TaskId,
    pub js_polyfills: TaskId,
    pub sw: TaskId,
    pub html: TaskId,
    pub img: TaskId,
    pub fonts: TaskId,
    pub compile: TaskId,
}

impl SiteTasks {
    /// Steps that run `target`.
    ///
    /// `compile` cleans first; every other task runs on its own.
    pub fn steps_for(&self, target: TaskId) -> Vec<Step> {
        if target == self.compile {
            compile_steps(self)
        } else {
            vec![Step::Task(target)]
        }
    }
}

/// `clean`, then the concurrent set `[js, css, img, html, fonts]`
pub fn compile_steps(tasks: &SiteTasks) -> Vec<Step> {
    vec![Step::Task(tasks.clean), Step::Task(tasks.compile)]
}

/// Register the asset tasks and their groups
pub fn site_graph() -> Result<(TaskGraph, SiteTasks), GraphError> {
    let mut builder = TaskGraphBuilder::new();

    let clean = builder.register("clean", Arc::new(CleanTask), &[])?;
    builder.describe(clean, "remove generated asset directories");

    let sw = builder.register("sw", Arc::new(ServiceWorkerTask), &[])?;
    builder.describe(sw, "copy service workers to the site root");
    let js_core = builder.register("js-core", Arc::new(JsCoreTask), &[])?;
    builder.describe(js_core, "bundle the main script");
    let js_async = builder.register("js-async", Arc::new(JsAsyncTask), &[])?;
    builder.describe(js_async, "minify async scripts");
    let js_polyfills = builder.register("js-polyfills", Arc::new(JsPolyfillsTask), &[])?;
    builder.describe(js_polyfills, "bundle polyfills");
    let js = builder.group("js", &["sw", "js-core", "js-async", "js-polyfills"])?;

    let css = builder.register("css", Arc::new(CssTask), &[])?;
    builder.describe(css, "compile stylesheets");
    let html = builder.register("html", Arc::new(HtmlTask::default()), &[])?;
    builder.describe(html, "render page templates");
    let img = builder.register("img", Arc::new(ImgTask), &[])?;
    builder.describe(img, "optimize images");
    let fonts = builder.register("fonts", Arc::new(FontsTask), &[])?;
    builder.describe(fonts, "copy fonts");

    let compile = builder.group("compile", &["js", "css", "img", "html", "fonts"])?;
    builder.describe(compile, "clean, then build every asset category");

    let graph = builder.build()?;
    Ok((
        graph,
        SiteTasks {
            clean,
            css,
            js,
            js_core,
            js_async,
            js_polyfills,
            sw,
            html,
            img,
            fonts,
            compile,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::TempDir;

    use assetline_core::BuildMode;
    use assetline_tasks::{
        CollectingReporter, SchedulerOptions, TaskEvent, TaskReporter, TaskScheduler, TaskStatus,
    };

    use crate::tasks::testing::{context, offline_config, write};

    #[test]
    fn test_site_graph_builds() {
        let (graph, tasks) = site_graph().unwrap();
        assert_eq!(graph.len(), 11);
        assert_eq!(graph.lookup("js-polyfills"), Some(tasks.js_polyfills));

        let closure = graph.closure(&[tasks.js]);
        assert_eq!(closure.len(), 5);
        assert_eq!(*closure.last().unwrap(), tasks.js);
    }

    #[test]
    fn test_compile_plan_lists_members() {
        let (graph, tasks) = site_graph().unwrap();
        let plan = graph.execution_plan(&[tasks.compile]);
        assert!(plan.contains("compile -> clean, then build every asset category"));
        assert!(plan.contains("js -> <group> (after: sw, js-core, js-async, js-polyfills)"));
    }

    /// Records completion events in order
    #[derive(Default)]
    struct Order(Mutex<Vec<String>>);

    impl TaskReporter for Order {
        fn report(&self, event: &TaskEvent) {
            if let TaskEvent::Completed { task, .. } = event {
                self.0.lock().unwrap().push(task.clone());
            }
        }
    }

    #[tokio::test]
    async fn test_compile_builds_fixture_site() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "build/static/css/stale.css", "old");
        write(temp.path(), "src/scss/main.css", "a { color: red; }");
        write(temp.path(), "src/templates/views/index.html", "<p>{{ asset_path }}</p>");
        write(temp.path(), "src/img/logo.svg", "<svg/>");
        write(temp.path(), "src/fonts/a.woff", "font");
        write(temp.path(), "src/js/sw/sw.js", "sw");

        let ctx = context(temp.path(), offline_config(), BuildMode::Development);
        let (graph, tasks) = site_graph().unwrap();
        let order = Arc::new(Order::default());
        let scheduler = TaskScheduler::new(SchedulerOptions::default(), order.clone());

        let summary = scheduler
            .run_sequence(&graph, &tasks.steps_for(tasks.compile), &ctx)
            .await;

        // app.js, async/ and polyfills are absent: warned, not failed
        assert!(summary.is_success(), "{:?}", summary.failed());
        assert!(matches!(
            summary.get("js-core").unwrap().status,
            TaskStatus::NothingToDo(_)
        ));
        assert!(!temp.path().join("build/static/css/stale.css").exists());
        assert!(temp.path().join("build/static/css/main.css").exists());
        assert_eq!(
            fs::read_to_string(temp.path().join("build/index.html")).unwrap(),
            "<p>/static</p>"
        );
        assert!(temp.path().join("build/sw.js").exists());

        let order = order.0.lock().unwrap();
        assert_eq!(order.first().map(String::as_str), Some("clean"));
        assert_eq!(order.last().map(String::as_str), Some("compile"));
    }

    /// Every generated file under `root`, keyed by relative path
    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file() && !e.path().starts_with(root.join("src")))
            .map(|e| {
                let relative = e.path().strip_prefix(root).unwrap().to_path_buf();
                (relative, fs::read(e.path()).unwrap())
            })
            .collect()
    }

    #[tokio::test]
    async fn test_compile_twice_is_byte_identical() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/scss/main.css", ".nav { padding: 1rem; user-select: none; }");
        write(temp.path(), "src/scss/pages/home.css", "h1 { margin: 0 .5rem; }");
        write(
            temp.path(),
            "src/templates/views/index.html",
            "---\ntitle: Home\n---\n<h1>{{ title }}</h1><link href=\"{{ asset_path }}/css/main.css\">",
        );
        write(temp.path(), "src/img/icons/menu.svg", "<!-- menu -->\n<svg>\n  <path/>\n</svg>\n");
        write(temp.path(), "src/fonts/a.woff", "font");
        write(temp.path(), "src/js/sw/sw.js", "self.skipWaiting();");

        let (graph, tasks) = site_graph().unwrap();
        let reporter = Arc::new(CollectingReporter::default());
        let scheduler = TaskScheduler::new(SchedulerOptions::default(), reporter);

        for mode in [BuildMode::Development, BuildMode::Production] {
            let ctx = context(temp.path(), offline_config(), mode);

            let summary = scheduler.run_sequence(&graph, &compile_steps(&tasks), &ctx).await;
            assert!(summary.is_success(), "{:?}", summary.failed());
            let first = snapshot(temp.path());

            let summary = scheduler.run_sequence(&graph, &compile_steps(&tasks), &ctx).await;
            assert!(summary.is_success(), "{:?}", summary.failed());
            let second = snapshot(temp.path());

            assert!(first.len() >= 6, "{:?}", first.keys().collect::<Vec<_>>());
            assert_eq!(first, second, "{} output differs between runs", mode);
        }
    }

    #[tokio::test]
    async fn test_failed_member_leaves_siblings_built() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/templates/views/index.html", "{% include \"gone\" %}");
        write(temp.path(), "src/fonts/a.woff", "font");

        let ctx = context(temp.path(), offline_config(), BuildMode::Development);
        let (graph, tasks) = site_graph().unwrap();
        let reporter = Arc::new(CollectingReporter::default());
        let scheduler = TaskScheduler::new(SchedulerOptions::default(), reporter);

        let summary = scheduler.run_sequence(&graph, &compile_steps(&tasks), &ctx).await;
        assert!(!summary.is_success());
        assert_eq!(summary.failed().len(), 1);
        assert!(temp.path().join("build/static/fonts/a.woff").exists());
    }
}
