use esengine::evaluate_script;

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    match evaluate_script(script) {
        Ok(v) => v,
        Err(e) => e.to_string(),
    }
}

#[cfg(test)]
mod control_flow_tests {
    use super::*;

    #[test]
    fn completion_values() {
        assert_eq!(eval("1; if (true) { 2; } else { 3; }"), "2");
        assert_eq!(eval("5; var x = 1;"), "5");
        assert_eq!(eval("var i = 0; while (i < 3) { i++; }"), "2");
        assert_eq!(eval("7; do { } while (false)"), "7");
        assert_eq!(eval("1; for (var i = 0; i < 2; i++) { i; }"), "1");
        assert_eq!(eval("3; try { 4; } finally { 5; }"), "4");
    }

    #[test]
    fn break_and_continue_keep_completion_values() {
        assert_eq!(eval("do { 1; break; } while (false)"), "1");
        assert_eq!(eval("l: { 2; break l; }"), "2");
        assert_eq!(eval("switch (1) { case 1: 'a'; break; }"), "a");
        assert_eq!(eval("for (var i = 0; i < 1; i++) { 'x'; continue; }"), "x");
        assert_eq!(eval("var o = { p: 1 }; for (var k in o) { k; break; }"), "p");
        assert_eq!(eval("eval('outer: for (;;) { 3; for (;;) { break outer; } }')"), "3");
        assert_eq!(eval("0; while (true) { break; }"), "0");
    }

    #[test]
    fn loops_and_labels() {
        let script = r#"
            var out = [];
            outer: for (var i = 0; i < 3; i++) {
                for (var j = 0; j < 3; j++) {
                    if (j === 1) continue outer;
                    if (i === 2) break outer;
                    out.push(i + '' + j);
                }
            }
            out.join()
        "#;
        assert_eq!(eval(script), "00,10");
        assert_eq!(eval("var n = 0; do { n++; } while (n < 5); n"), "5");
        assert_eq!(eval("var r = 0; block: { r = 1; break block; r = 2; } r"), "1");
        assert!(eval("foo: foo: ;").starts_with("SyntaxError"));
        assert!(eval("break;").starts_with("SyntaxError"));
        assert!(eval("while (true) { function f() { break; } }").starts_with("SyntaxError"));
        assert!(eval("return 1;").starts_with("SyntaxError"));
    }

    #[test]
    fn switch_semantics() {
        let script = r#"
            function classify(v) {
                var r = [];
                switch (v) {
                    case 1: r.push('one');
                    case 2: r.push('two'); break;
                    default: r.push('default');
                    case 3: r.push('three');
                }
                return r.join();
            }
            [classify(1), classify(2), classify(3), classify(9)].join('|')
        "#;
        assert_eq!(eval(script), "one,two|two|three|default,three");
        assert_eq!(eval("switch ('1') { case 1: 'loose'; break; default: 'strict'; }"), "strict");
    }

    #[test]
    fn switch_evaluates_selectors_once() {
        let script = r#"
            var calls = [];
            function sel(v) { calls.push(v); return v; }
            switch (9) {
                case sel(1): break;
                default: calls.push('d');
                case sel(2): calls.push('after');
            }
            calls.join()
        "#;
        assert_eq!(eval(script), "1,2,d,after");
    }

    #[test]
    fn exceptions() {
        assert_eq!(eval("try { throw 1; } catch (e) { e + 1 }"), "2");
        assert_eq!(eval("var log = []; try { try { throw 'x'; } finally { log.push('f'); } } catch (e) { log.push(e); } log.join()"), "f,x");
        assert_eq!(eval("function f() { try { return 'try'; } finally { return 'finally'; } } f()"), "finally");
        assert_eq!(eval("function f() { try { throw 1; } finally { return 'swallowed'; } } f()"), "swallowed");
        assert_eq!(eval("var n = 0; for (;;) { try { break; } finally { n++; } } n"), "1");
        assert_eq!(eval("throw { toString: function () { return 'custom'; } }"), "Uncaught custom");
        assert_eq!(eval("throw 42"), "Uncaught 42");
    }

    #[test]
    fn error_objects_from_engine_faults() {
        assert_eq!(eval("try { undefined(); } catch (e) { e instanceof TypeError }"), "true");
        assert_eq!(eval("try { new 1; } catch (e) { e.name }"), "TypeError");
        assert_eq!(eval("try { ({}) instanceof 1; } catch (e) { e.name }"), "TypeError");
        assert_eq!(eval("try { 'x' in 'y'; } catch (e) { e.name }"), "TypeError");
        assert_eq!(eval("try { eval('('); } catch (e) { e instanceof SyntaxError }"), "true");
    }

    #[test]
    fn logical_and_conditional_operators() {
        assert_eq!(eval("0 || 'a'"), "a");
        assert_eq!(eval("1 && 'b'"), "b");
        assert_eq!(eval("null && missing"), "null");
        assert_eq!(eval("true ? 'y' : missing"), "y");
        assert_eq!(eval("var i = 0; (i++, i++, i)"), "2");
        assert_eq!(eval("void 0"), "undefined");
    }

    #[test]
    fn compound_assignment_and_update() {
        assert_eq!(eval("var x = 5; x += 2; x *= 3; x -= 1; x"), "20");
        assert_eq!(eval("var s = 'a'; s += 1; s"), "a1");
        assert_eq!(eval("var o = { n: 1 }; o.n++ + ++o.n"), "4");
        assert_eq!(eval("var x = '5'; x++; typeof x + x"), "number6");
        assert_eq!(eval("var x = 1; x <<= 3; x |= 1; x ^= 2; x"), "11");
        assert_eq!(eval("var a = [1]; a[0] += 1; a[0]"), "2");
    }

    #[test]
    fn automatic_semicolon_insertion() {
        assert_eq!(eval("var a = 1\nvar b = 2\na + b"), "3");
        assert_eq!(eval("function f() { return\n42 } typeof f()"), "undefined");
        assert_eq!(eval("var i = 1\ni\n++\ni; i"), "2");
        assert!(eval("var a = 1 var b = 2").starts_with("SyntaxError"));
    }

    #[test]
    fn regular_expression_literals_after_operators() {
        assert_eq!(eval("var re = /a+/g; 'caaab'.replace(re, '-')"), "c-b");
        assert_eq!(eval("var x = 4 / 2 / 1; x"), "2");
        assert_eq!(eval("typeof /x/"), "object");
    }
}
