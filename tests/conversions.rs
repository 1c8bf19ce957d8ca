use esengine::evaluate_script;

// Initialize logger for this integration test binary so `RUST_LOG` is honored.
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
mod conversion_tests {
    use super::*;

    #[test]
    fn to_number_of_strings() {
        assert_eq!(eval("+'  42  '"), "42");
        assert_eq!(eval("+''"), "0");
        assert_eq!(eval("+'0x1F'"), "31");
        assert_eq!(eval("+'1e3'"), "1000");
        assert_eq!(eval("+'-Infinity'"), "-Infinity");
        assert_eq!(eval("isNaN(+'12px')"), "true");
        assert_eq!(eval("+'\\u00a0 7 \\ufeff'"), "7");
    }

    #[test]
    fn to_number_of_other_types() {
        assert_eq!(eval("+true + +false"), "1");
        assert_eq!(eval("+null"), "0");
        assert_eq!(eval("isNaN(+undefined)"), "true");
        assert_eq!(eval("+[5]"), "5");
        assert_eq!(eval("+[]"), "0");
        assert_eq!(eval("+{ valueOf: function () { return 9; } }"), "9");
    }

    #[test]
    fn number_to_string() {
        assert_eq!(eval("String(0.1 + 0.2)"), "0.30000000000000004");
        assert_eq!(eval("String(1e21)"), "1e+21");
        assert_eq!(eval("String(123456789012345680000)"), "123456789012345680000");
        assert_eq!(eval("String(0.000001)"), "0.000001");
        assert_eq!(eval("String(1e-7)"), "1e-7");
        assert_eq!(eval("String(-0)"), "0");
        assert_eq!(eval("String(-1.5)"), "-1.5");
    }

    #[test]
    fn to_boolean_truthiness() {
        assert_eq!(eval("[!!'', !!'0', !!0, !!-0, !!NaN, !!null, !!undefined, !!{}, !![]].join()"),
            "false,true,false,false,false,false,false,true,true");
    }

    #[test]
    fn to_primitive_order() {
        assert_eq!(
            eval("var o = { valueOf: function () { return 1; }, toString: function () { return 'two'; } }; (o + 1) + '|' + String(o)"),
            "2|two"
        );
        assert_eq!(
            eval("try { +{ valueOf: function () { return {}; }, toString: function () { return {}; } }; } catch (e) { e instanceof TypeError }"),
            "true"
        );
    }

    #[test]
    fn integer_conversions() {
        assert_eq!(eval("4294967297 | 0"), "1");
        assert_eq!(eval("-1 >>> 0"), "4294967295");
        assert_eq!(eval("2147483648 | 0"), "-2147483648");
        assert_eq!(eval("1 << 33"), "2");
        assert_eq!(eval("-16 >> 2"), "-4");
        assert_eq!(eval("~5"), "-6");
        assert_eq!(eval("NaN | 0"), "0");
    }

    #[test]
    fn equality_algorithms() {
        assert_eq!(eval("null == undefined"), "true");
        assert_eq!(eval("null == 0"), "false");
        assert_eq!(eval("'1' == 1"), "true");
        assert_eq!(eval("true == 1"), "true");
        assert_eq!(eval("[1] == 1"), "true");
        assert_eq!(eval("NaN == NaN"), "false");
        assert_eq!(eval("'1' === 1"), "false");
        assert_eq!(eval("0 === -0"), "true");
        assert_eq!(eval("var o = {}; o === o"), "true");
        assert_eq!(eval("({}) == ({})"), "false");
    }

    #[test]
    fn relational_comparison() {
        assert_eq!(eval("'a' < 'b'"), "true");
        assert_eq!(eval("'10' < '9'"), "true");
        assert_eq!(eval("'10' < 9"), "false");
        assert_eq!(eval("NaN < 1 || NaN >= 1"), "false");
        assert_eq!(eval("null >= 0"), "true");
    }

    #[test]
    fn typeof_values() {
        assert_eq!(
            eval("[typeof 1, typeof 'a', typeof true, typeof undefined, typeof null, typeof {}, typeof function () {}].join()"),
            "number,string,boolean,undefined,object,object,function"
        );
        assert_eq!(eval("typeof notDeclaredAnywhere"), "undefined");
    }

    #[test]
    fn to_object_of_nullish_throws() {
        assert_eq!(eval("try { null.x } catch (e) { e.name }"), "TypeError");
        assert_eq!(eval("try { undefined.x = 1 } catch (e) { e.name }"), "TypeError");
        assert_eq!(eval("'abc'.length + (5).toString()"), "35");
    }

    #[test]
    fn string_concatenation_and_arithmetic() {
        assert_eq!(eval("1 + '2'"), "12");
        assert_eq!(eval("'3' * '4'"), "12");
        assert_eq!(eval("1 / 0"), "Infinity");
        assert_eq!(eval("-1 / 0"), "-Infinity");
        assert_eq!(eval("1 / -0"), "-Infinity");
        assert_eq!(eval("5 % -3"), "2");
        assert_eq!(eval("-5 % 3"), "-2");
        assert_eq!(eval("isNaN(0 / 0)"), "true");
    }
}
