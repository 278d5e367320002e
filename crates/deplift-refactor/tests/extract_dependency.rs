//! End-to-end scenarios for the extract-as-a-dependency operation.
//!
//! Every comparison goes through the printer on both sides, so fixtures can
//! be written with natural formatting.

use pretty_assertions::assert_eq;

use deplift_refactor::extract::is_available;
use deplift_refactor::{
    extract_dependency, Argument, ArgumentDisposition, ArgumentPolicy, CancelFlag, ExtractError,
    ExtractOutcome, FileId, KeepAll, Solution, UnchangedReason,
};
use deplift_syntax::ast::Span;
use deplift_test_utils::{normalized, span_of_identifier};

fn solution(files: &[(&str, &str)]) -> Solution {
    let mut solution = Solution::new();
    for (file, source) in files {
        solution
            .add_document(FileId::new(*file), source)
            .unwrap_or_else(|err| panic!("fixture {file} does not parse: {err}"));
    }
    solution
}

fn selection(solution: &Solution, file: &str, ident: &str) -> (FileId, Span) {
    let file = FileId::new(file);
    let unit = solution.document(&file).expect("fixture document");
    let span = span_of_identifier(unit, ident);
    (file, span)
}

fn extract(
    solution: &Solution,
    file: &str,
    ident: &str,
    policy: &dyn ArgumentPolicy,
) -> Result<ExtractOutcome, ExtractError> {
    let (file, span) = selection(solution, file, ident);
    extract_dependency(solution, &file, span, policy, &CancelFlag::new())
}

fn applied(outcome: Result<ExtractOutcome, ExtractError>) -> Solution {
    match outcome {
        Ok(ExtractOutcome::Applied(solution)) => solution,
        other => panic!("expected an applied refactoring, got {other:?}"),
    }
}

fn assert_doc(solution: &Solution, file: &str, expected: &str) {
    let rendered = solution
        .render(&FileId::new(file))
        .unwrap_or_else(|| panic!("no document {file}"));
    assert_eq!(rendered, normalized(expected));
}

fn remove_all(args: &[Argument]) -> Option<Vec<ArgumentDisposition>> {
    Some(vec![ArgumentDisposition::Remove; args.len()])
}

#[test]
fn zero_argument_call_becomes_action_parameter() {
    let before = "
public class HelloWorld
{
    public static void DoSomething()
    {
        DoSomethingElse();
    }

    public static void DoSomethingElse()
    {
    }
}";
    let solution = solution(&[("a.cs", before)]);
    let refactored = applied(extract(&solution, "a.cs", "DoSomethingElse", &KeepAll));
    assert_doc(
        &refactored,
        "a.cs",
        "
public class HelloWorld
{
    public static void DoSomething(Action doSomethingElse)
    {
        doSomethingElse();
    }

    public static void DoSomethingElse()
    {
    }
}",
    );
}

#[test]
fn kept_int_argument_becomes_typed_action() {
    let before = "
public class HelloWorld
{
    public static void DoSomething()
    {
        DoSomethingElse(1);
    }

    public static void DoSomethingElse(int a)
    {
    }
}";
    let solution = solution(&[("a.cs", before)]);
    let refactored = applied(extract(&solution, "a.cs", "DoSomethingElse", &KeepAll));
    assert_doc(
        &refactored,
        "a.cs",
        "
public class HelloWorld
{
    public static void DoSomething(Action<int> doSomethingElse)
    {
        doSomethingElse(1);
    }

    public static void DoSomethingElse(int a)
    {
    }
}",
    );
}

#[test]
fn value_returning_call_becomes_func_parameter() {
    let before = "
public class HelloWorld
{
    public static int DoSomething()
    {
        return Compute();
    }

    public static int Compute()
    {
        return 5;
    }
}";
    let solution = solution(&[("a.cs", before)]);
    let refactored = applied(extract(&solution, "a.cs", "Compute", &KeepAll));
    assert_doc(
        &refactored,
        "a.cs",
        "
public class HelloWorld
{
    public static int DoSomething(Func<int> compute)
    {
        return compute();
    }

    public static int Compute()
    {
        return 5;
    }
}",
    );
}

#[test]
fn direct_caller_receives_a_method_group() {
    let before = "
public class HelloWorld
{
    public static void DoSomething()
    {
        DoSomethingElse();
    }

    public static void DoSomethingElse()
    {
    }

    public static void Caller()
    {
        DoSomething();
    }
}";
    let solution = solution(&[("a.cs", before)]);
    let refactored = applied(extract(&solution, "a.cs", "DoSomethingElse", &KeepAll));
    assert_doc(
        &refactored,
        "a.cs",
        "
public class HelloWorld
{
    public static void DoSomething(Action doSomethingElse)
    {
        doSomethingElse();
    }

    public static void DoSomethingElse()
    {
    }

    public static void Caller()
    {
        DoSomething(DoSomethingElse);
    }
}",
    );
}

#[test]
fn removed_argument_moves_into_a_caller_lambda() {
    let before = "
public class HelloWorld
{
    public static void DoSomething()
    {
        DoSomethingElse(1);
    }

    public static void DoSomethingElse(int a)
    {
    }

    public static void Caller()
    {
        DoSomething();
    }
}";
    let solution = solution(&[("a.cs", before)]);
    let refactored = applied(extract(&solution, "a.cs", "DoSomethingElse", &remove_all));
    assert_doc(
        &refactored,
        "a.cs",
        "
public class HelloWorld
{
    public static void DoSomething(Action doSomethingElse)
    {
        doSomethingElse();
    }

    public static void DoSomethingElse(int a)
    {
    }

    public static void Caller()
    {
        DoSomething(() => DoSomethingElse(1));
    }
}",
    );
}

#[test]
fn parameter_only_used_in_removed_argument_is_deleted() {
    let before = "
public class HelloWorld
{
    public static void DoSomething(int x)
    {
        DoSomethingElse(x);
    }

    public static void DoSomethingElse(int a)
    {
    }

    public static void Caller()
    {
        DoSomething(5);
    }
}";
    let solution = solution(&[("a.cs", before)]);
    let refactored = applied(extract(&solution, "a.cs", "DoSomethingElse", &remove_all));
    assert_doc(
        &refactored,
        "a.cs",
        "
public class HelloWorld
{
    public static void DoSomething(Action doSomethingElse)
    {
        doSomethingElse();
    }

    public static void DoSomethingElse(int a)
    {
    }

    public static void Caller()
    {
        DoSomething(() => DoSomethingElse(5));
    }
}",
    );
}

#[test]
fn parameter_used_outside_removed_argument_survives() {
    let before = "
public class HelloWorld
{
    public static void DoSomething(int x)
    {
        DoSomethingElse(x);
        Log(x);
    }

    public static void DoSomethingElse(int a)
    {
    }

    public static void Log(int a)
    {
    }

    public static void Caller()
    {
        DoSomething(5);
    }
}";
    let solution = solution(&[("a.cs", before)]);
    let refactored = applied(extract(&solution, "a.cs", "DoSomethingElse", &remove_all));
    assert_doc(
        &refactored,
        "a.cs",
        "
public class HelloWorld
{
    public static void DoSomething(int x, Action doSomethingElse)
    {
        doSomethingElse();
        Log(x);
    }

    public static void DoSomethingElse(int a)
    {
    }

    public static void Log(int a)
    {
    }

    public static void Caller()
    {
        DoSomething(5, () => DoSomethingElse(5));
    }
}",
    );
}

#[test]
fn mixed_retention_keeps_some_arguments_and_inlines_the_rest() {
    let before = "
public class HelloWorld
{
    public static void DoSomething(int x)
    {
        DoSomethingElse(x, 2);
    }

    public static void DoSomethingElse(int a, int b)
    {
    }

    public static void Caller()
    {
        DoSomething(5);
    }
}";
    let solution = solution(&[("a.cs", before)]);
    let policy = |_: &[Argument]| {
        Some(vec![ArgumentDisposition::Remove, ArgumentDisposition::Keep])
    };
    let refactored = applied(extract(&solution, "a.cs", "DoSomethingElse", &policy));
    assert_doc(
        &refactored,
        "a.cs",
        "
public class HelloWorld
{
    public static void DoSomething(Action<int> doSomethingElse)
    {
        doSomethingElse(2);
    }

    public static void DoSomethingElse(int a, int b)
    {
    }

    public static void Caller()
    {
        DoSomething(b => DoSomethingElse(5, b));
    }
}",
    );
}

#[test]
fn propagation_crosses_documents() {
    let a = "
public class HelloWorld
{
    public static void DoSomething()
    {
        DoSomethingElse();
    }

    public static void DoSomethingElse()
    {
    }
}";
    let b = "
public class Client
{
    public static void Run()
    {
        HelloWorld.DoSomething();
    }
}";
    let solution = solution(&[("a.cs", a), ("b.cs", b)]);
    let refactored = applied(extract(&solution, "a.cs", "DoSomethingElse", &KeepAll));
    assert_doc(
        &refactored,
        "b.cs",
        "
public class Client
{
    public static void Run()
    {
        HelloWorld.DoSomething(DoSomethingElse);
    }
}",
    );
}

#[test]
fn propagation_is_one_hop_only() {
    let before = "
public class HelloWorld
{
    public static void DoSomething()
    {
        DoSomethingElse();
    }

    public static void DoSomethingElse()
    {
    }

    public static void Direct()
    {
        DoSomething();
    }

    public static void Indirect()
    {
        Direct();
    }
}";
    let solution = solution(&[("a.cs", before)]);
    let refactored = applied(extract(&solution, "a.cs", "DoSomethingElse", &KeepAll));
    assert_doc(
        &refactored,
        "a.cs",
        "
public class HelloWorld
{
    public static void DoSomething(Action doSomethingElse)
    {
        doSomethingElse();
    }

    public static void DoSomethingElse()
    {
    }

    public static void Direct()
    {
        DoSomething(DoSomethingElse);
    }

    public static void Indirect()
    {
        Direct();
    }
}",
    );
}

#[test]
fn qualified_call_keeps_its_receiver_in_the_method_group() {
    let a = "
public class A
{
    public void DoSomething(B helper)
    {
        helper.Run();
    }

    public void Caller(B b)
    {
        DoSomething(b);
    }
}";
    let b = "
public class B
{
    public void Run()
    {
    }
}";
    let solution = solution(&[("a.cs", a), ("b.cs", b)]);
    let refactored = applied(extract(&solution, "a.cs", "Run", &KeepAll));
    assert_doc(
        &refactored,
        "a.cs",
        "
public class A
{
    public void DoSomething(Action run)
    {
        run();
    }

    public void Caller(B b)
    {
        DoSomething(b.Run);
    }
}",
    );
}

#[test]
fn removed_argument_on_a_qualified_call_inlines_the_receiver() {
    let a = "
public class A
{
    public void DoSomething(B h, int x)
    {
        h.Run(x);
    }

    public void Caller(B b)
    {
        DoSomething(b, 5);
    }
}";
    let b = "
public class B
{
    public void Run(int value)
    {
    }
}";
    let solution = solution(&[("a.cs", a), ("b.cs", b)]);
    let refactored = applied(extract(&solution, "a.cs", "Run", &remove_all));
    assert_doc(
        &refactored,
        "a.cs",
        "
public class A
{
    public void DoSomething(Action run)
    {
        run();
    }

    public void Caller(B b)
    {
        DoSomething(() => b.Run(5));
    }
}",
    );
}

#[test]
fn chained_call_extracts_the_last_hop() {
    let a = "
public class A
{
    public B Foo()
    {
        return new B();
    }
}";
    let b = "
public class B
{
    public void Bar()
    {
    }
}";
    let main = "
public class Program
{
    public void DoSomething(A a)
    {
        a.Foo().Bar();
    }

    public void Caller(A x)
    {
        DoSomething(x);
    }
}";
    let solution = solution(&[("a.cs", a), ("b.cs", b), ("main.cs", main)]);
    let refactored = applied(extract(&solution, "main.cs", "Bar", &KeepAll));
    assert_doc(
        &refactored,
        "main.cs",
        "
public class Program
{
    public void DoSomething(Action bar)
    {
        bar();
    }

    public void Caller(A x)
    {
        DoSomething(x.Foo().Bar);
    }
}",
    );
}

#[test]
fn chained_call_extracts_the_first_hop() {
    let a = "
public class A
{
    public B Foo()
    {
        return new B();
    }
}";
    let b = "
public class B
{
    public void Bar()
    {
    }
}";
    let main = "
public class Program
{
    public void DoSomething(A a)
    {
        a.Foo().Bar();
    }

    public void Caller(A x)
    {
        DoSomething(x);
    }
}";
    let solution = solution(&[("a.cs", a), ("b.cs", b), ("main.cs", main)]);
    let refactored = applied(extract(&solution, "main.cs", "Foo", &KeepAll));
    assert_doc(
        &refactored,
        "main.cs",
        "
public class Program
{
    public void DoSomething(Func<B> foo)
    {
        foo().Bar();
    }

    public void Caller(A x)
    {
        DoSomething(x.Foo);
    }
}",
    );
}

#[test]
fn constructor_callers_are_rewritten_through_new() {
    let before = "
public class Widget
{
    public Widget()
    {
        Helper();
    }

    public void Helper()
    {
    }

    public static void Make()
    {
        Widget w = new Widget();
    }
}";
    let solution = solution(&[("a.cs", before)]);
    let refactored = applied(extract(&solution, "a.cs", "Helper", &KeepAll));
    assert_doc(
        &refactored,
        "a.cs",
        "
public class Widget
{
    public Widget(Action helper)
    {
        helper();
    }

    public void Helper()
    {
    }

    public static void Make()
    {
        Widget w = new Widget(Helper);
    }
}",
    );
}

#[test]
fn expression_bodied_enclosing_method_is_supported() {
    let before = "
public class HelloWorld
{
    public static int DoSomething() => Compute();

    public static int Compute()
    {
        return 5;
    }
}";
    let solution = solution(&[("a.cs", before)]);
    let refactored = applied(extract(&solution, "a.cs", "Compute", &KeepAll));
    assert_doc(
        &refactored,
        "a.cs",
        "
public class HelloWorld
{
    public static int DoSomething(Func<int> compute) => compute();

    public static int Compute()
    {
        return 5;
    }
}",
    );
}

#[test]
fn two_extractions_compose() {
    let before = "
public class HelloWorld
{
    public static void DoSomething()
    {
        First();
        Second();
    }

    public static void First()
    {
    }

    public static void Second()
    {
    }

    public static void Caller()
    {
        DoSomething();
    }
}";
    let solution = solution(&[("a.cs", before)]);
    let once = applied(extract(&solution, "a.cs", "First", &KeepAll));
    let twice = applied(extract(&once, "a.cs", "Second", &KeepAll));
    assert_doc(
        &twice,
        "a.cs",
        "
public class HelloWorld
{
    public static void DoSomething(Action first, Action second)
    {
        first();
        second();
    }

    public static void First()
    {
    }

    public static void Second()
    {
    }

    public static void Caller()
    {
        DoSomething(First, Second);
    }
}",
    );
}

#[test]
fn caller_with_mismatched_arity_is_skipped() {
    let before = "
public class HelloWorld
{
    public static void DoSomething()
    {
        DoSomethingElse();
    }

    public static void DoSomethingElse()
    {
    }

    public static void Caller()
    {
        DoSomething(1);
    }
}";
    let solution = solution(&[("a.cs", before)]);
    let refactored = applied(extract(&solution, "a.cs", "DoSomethingElse", &KeepAll));
    assert_doc(
        &refactored,
        "a.cs",
        "
public class HelloWorld
{
    public static void DoSomething(Action doSomethingElse)
    {
        doSomethingElse();
    }

    public static void DoSomethingElse()
    {
    }

    public static void Caller()
    {
        DoSomething(1);
    }
}",
    );
}

#[test]
fn unresolved_target_leaves_the_solution_unchanged() {
    let before = "public class C { public void M() { Missing(); } }";
    let solution = solution(&[("a.cs", before)]);
    let outcome = extract(&solution, "a.cs", "Missing", &KeepAll);
    assert!(matches!(
        outcome,
        Ok(ExtractOutcome::Unchanged(UnchangedReason::TargetUnresolved))
    ));
}

#[test]
fn declining_policy_cancels_without_edits() {
    let before = "public class C { public void M() { Helper(1); } public void Helper(int a) { } }";
    let solution = solution(&[("a.cs", before)]);
    let policy = |_: &[Argument]| None;
    let outcome = extract(&solution, "a.cs", "Helper", &policy);
    assert!(matches!(
        outcome,
        Ok(ExtractOutcome::Unchanged(UnchangedReason::PolicyCancelled))
    ));
}

#[test]
fn short_decision_list_is_rejected_as_unchanged() {
    let before = "public class C { public void M() { Helper(1, 2); } public void Helper(int a, int b) { } }";
    let solution = solution(&[("a.cs", before)]);
    let policy = |_: &[Argument]| Some(vec![ArgumentDisposition::Keep]);
    let outcome = extract(&solution, "a.cs", "Helper", &policy);
    assert!(matches!(
        outcome,
        Ok(ExtractOutcome::Unchanged(UnchangedReason::DecisionLengthMismatch))
    ));
}

#[test]
fn more_than_six_kept_arguments_is_an_error() {
    let before = "
public class C
{
    public void M()
    {
        Helper(1, 2, 3, 4, 5, 6, 7);
    }

    public void Helper(int a, int b, int c, int d, int e, int f, int g)
    {
    }
}";
    let solution = solution(&[("a.cs", before)]);
    let outcome = extract(&solution, "a.cs", "Helper", &KeepAll);
    let Err(ExtractError::UnsupportedArity(err)) = outcome else {
        panic!("expected an arity error, got {outcome:?}");
    };
    assert_eq!(err.arity, 7);
}

#[test]
fn static_constructor_body_is_not_applicable() {
    let before = "
public class C
{
    static C()
    {
        Helper();
    }

    public static void Helper()
    {
    }
}";
    let solution = solution(&[("a.cs", before)]);
    let outcome = extract(&solution, "a.cs", "Helper", &KeepAll);
    assert!(matches!(outcome, Err(ExtractError::NotApplicable)));
}

#[test]
fn selection_outside_any_call_is_not_applicable() {
    let before = "public class C { public void M(int x) { Helper(x); } public void Helper(int a) { } }";
    let solution = solution(&[("a.cs", before)]);
    let outcome = extract(&solution, "a.cs", "x", &KeepAll);
    assert!(matches!(outcome, Err(ExtractError::NotApplicable)));
}

#[test]
fn cancellation_short_circuits() {
    let before = "public class C { public void M() { Helper(); } public void Helper() { } }";
    let solution = solution(&[("a.cs", before)]);
    let (file, span) = selection(&solution, "a.cs", "Helper");
    let cancel = CancelFlag::new();
    cancel.cancel();
    let outcome = extract_dependency(&solution, &file, span, &KeepAll, &cancel);
    assert!(matches!(outcome, Err(ExtractError::Cancelled)));
}

#[test]
fn availability_tracks_the_selection() {
    let before = "
public class C
{
    public void M(int x)
    {
        Helper(x);
    }

    public void Helper(int a)
    {
    }

    static C()
    {
        Helper(0);
    }
}";
    let solution = solution(&[("a.cs", before)]);
    let file = FileId::new("a.cs");
    let unit = solution.document(&file).expect("document");
    let spans = deplift_test_utils::identifier_spans(unit, "Helper");
    assert_eq!(spans.len(), 2);
    // In source order: the call in M, then the call in the static ctor.
    assert!(is_available(&solution, &file, spans[0]));
    assert!(!is_available(&solution, &file, spans[1]));

    let x_span = span_of_identifier(unit, "x");
    assert!(!is_available(&solution, &file, x_span));
}

#[test]
fn receiver_selection_offers_the_extraction() {
    let a = "
public class A
{
    public void DoSomething(B helper)
    {
        helper.Run();
    }
}";
    let b = "
public class B
{
    public void Run()
    {
    }
}";
    let solution = solution(&[("a.cs", a), ("b.cs", b)]);
    let file = FileId::new("a.cs");
    let unit = solution.document(&file).expect("document");
    let span = span_of_identifier(unit, "helper");
    assert!(is_available(&solution, &file, span));
}
